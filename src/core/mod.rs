// Core modules implementing data formatting, command text, and error modeling.
pub mod command;
pub mod datablock;
pub mod error;
pub mod hist;
pub mod palette;
