pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use async_trait::async_trait;
pub use derivative::Derivative;
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fs,
    path::{Path, PathBuf},
};
pub use strum::{AsRefStr, Display, EnumString};
