mod rocksdb;
mod sequence;

pub use rocksdb::RocksDbStore;
