pub mod db_model;
pub mod open_data_model;
pub mod ride;
pub mod stats;
