mod literals;
mod logging;
mod rendering;
mod tree;
