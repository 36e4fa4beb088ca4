//! Dataset model and persistence.

mod card;
mod store;

pub use card::{
    today, Card, Dataset, ThemeMeta, CARD_STRING_FIELDS, IDENTITY_FIELDS, REQUIRED_FIELDS,
};
pub use store::{
    dataset_from_value, load_dataset, parse_dataset_str, save_dataset, write_atomic,
    write_json_atomic, LoadedDataset,
};

pub const DEFAULT_DATASET_PATH: &str = "cards-data.json";
