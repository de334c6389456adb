pub mod clock;
pub mod cms;
pub mod constants;
pub mod crypto;
pub mod der_writer;
pub mod document;
pub mod json;
