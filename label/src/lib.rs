//! Label catalog of the semantic drone dataset.
//!
//! The table follows the Cityscapes label layout. The ids are consumed by
//! external evaluation tools and are treated as supplied data. They have not
//! been verified against the dataset release.

use itertools::Itertools;
use serde::Serialize;

/// The train id marking labels that are excluded from training.
pub const IGNORE_TRAIN_ID: u8 = 255;

/// An RGB color triple.
pub type Color = [u8; 3];

/// A class of the segmentation dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Label {
    /// Unique class name, e.g. "car".
    pub name: &'static str,
    /// The value representing this class in ground truth images.
    pub id: u8,
    /// The class index used during training. Several labels may share one
    /// train id. [IGNORE_TRAIN_ID] excludes the label.
    pub train_id: u8,
    /// The name of the category the label belongs to.
    pub category: &'static str,
    /// The id of the category.
    pub category_id: u8,
    /// Whether the label distinguishes single instances.
    pub has_instances: bool,
    /// Whether pixels of this label are ignored in evaluation.
    pub ignore_in_eval: bool,
    pub color: Color,
}

impl Label {
    /// Returns true if the label takes part in training.
    pub fn is_trainable(&self) -> bool {
        self.train_id != IGNORE_TRAIN_ID
    }
}

#[allow(clippy::too_many_arguments)]
const fn label(
    name: &'static str,
    id: u8,
    train_id: u8,
    category: &'static str,
    category_id: u8,
    has_instances: bool,
    ignore_in_eval: bool,
    color: Color,
) -> Label {
    Label {
        name,
        id,
        train_id,
        category,
        category_id,
        has_instances,
        ignore_in_eval,
        color,
    }
}

#[rustfmt::skip]
static LABELS: [Label; 20] = [
    //     name                 id  trainId category        catId  hasInstances ignoreInEval color
    label("tree",               0,  0,      "nature",       0,     false,       false,       [  0,   0,   0]),
    label("grass",              1,  1,      "nature",       0,     false,       true,        [111,  74,   0]),
    label("other vegetation",   2,  2,      "nature",       0,     false,       true,        [ 81,   0,  81]),
    label("dirt",               3,  3,      "flat",         1,     false,       true,        [128,  64, 128]),
    label("gravel",             4,  4,      "flat",         1,     false,       true,        [244,  35, 232]),
    label("rocks",              5,  5,      "flat",         1,     false,       true,        [250, 170, 160]),
    label("water",              6,  6,      "flat",         1,     false,       false,       [230, 150, 140]),
    label("paved area",         7,  7,      "construction", 2,     false,       true,        [ 70,  70,  70]),
    label("pool",               8,  8,      "construction", 2,     false,       true,        [102, 102, 156]),
    label("person",             9,  9,      "human",        3,     true,        false,       [220,  20,  60]),
    label("dog",                10, 10,     "animal",       4,     true,        false,       [255,   0,   0]),
    label("car",                11, 11,     "vehicle",      5,     true,        false,       [  0,   0, 142]),
    label("bicycle",            12, 12,     "vehicle",      5,     true,        false,       [  0,   0,  70]),
    label("roof",               13, 13,     "construction", 2,     false,       false,       [190, 153, 153]),
    label("wall",               14, 14,     "construction", 2,     false,       true,        [180, 165, 180]),
    label("fence",              15, 15,     "object",       6,     false,       true,        [153, 153, 153]),
    label("fence-pole",         16, 16,     "object",       6,     false,       true,        [153, 153, 150]),
    label("window",             17, 17,     "construction", 2,     false,       true,        [150, 100, 100]),
    label("door",               18, 18,     "construction", 2,     false,       true,        [150, 120,  90]),
    label("obstacle",           19, 19,     "object",       6,     false,       false,       [220, 220,   0]),
];

/// The ordered label table.
pub fn labels() -> &'static [Label] {
    &LABELS
}

pub fn by_name(name: &str) -> Option<&'static Label> {
    LABELS.iter().find(|label| label.name == name)
}

pub fn by_id(id: u8) -> Option<&'static Label> {
    LABELS.iter().find(|label| label.id == id)
}

/// Finds the label of a train id. The first label in table order wins when
/// several labels share the id.
pub fn by_train_id(train_id: u8) -> Option<&'static Label> {
    if train_id == IGNORE_TRAIN_ID {
        return None;
    }
    LABELS.iter().find(|label| label.train_id == train_id)
}

/// Names of the trainable labels in table order.
pub fn stuff_classes() -> Vec<&'static str> {
    LABELS
        .iter()
        .filter(|label| label.is_trainable())
        .map(|label| label.name)
        .collect()
}

/// Colors of the trainable labels in table order.
pub fn stuff_colors() -> Vec<Color> {
    LABELS
        .iter()
        .filter(|label| label.is_trainable())
        .map(|label| label.color)
        .collect()
}

/// Distinct `(category_id, category)` pairs in first-seen order.
pub fn categories() -> Vec<(u8, &'static str)> {
    LABELS
        .iter()
        .map(|label| (label.category_id, label.category))
        .unique()
        .collect()
}
