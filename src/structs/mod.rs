pub mod alpha;
pub mod point;
pub mod storage;
