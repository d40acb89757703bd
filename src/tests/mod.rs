mod broadcast;
mod matrix;
mod msm7;
mod ppp;
mod store;
mod writer;


pub use data::*;
pub use writer::BitWriter;

use log::LevelFilter;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}
