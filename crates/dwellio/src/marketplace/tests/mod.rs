mod common;

mod offers;
mod properties;
