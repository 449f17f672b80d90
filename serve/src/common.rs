pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use derivative::Derivative;
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use ndarray::{Array3, ArrayD, Ix3, IxDyn};
pub use once_cell::sync::Lazy;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
pub use tch::{Device, IValue, Kind, Tensor};
