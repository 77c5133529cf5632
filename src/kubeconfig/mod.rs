mod encode;
mod fragment;

pub use fragment::{synthesize, ConfigFragment};
