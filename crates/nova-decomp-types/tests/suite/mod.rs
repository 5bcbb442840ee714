mod common_supertype;
mod signatures;
