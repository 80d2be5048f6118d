pub mod app;
pub mod config;
pub mod demo_seeder;
pub mod error;
pub mod models {
    pub mod page;
    pub mod stream;
}
pub mod db {
    pub mod memory;
    pub mod repository;
}
pub mod search {
    pub mod backend;
    pub mod document;
    pub mod elasticsearch2;
    pub mod elasticsearch7;
    pub mod fields;
    pub mod indexer;
    pub mod memory;
    pub mod query;
    pub mod request;
    pub mod sanitize;
    pub mod suggest;
    pub mod transport;
}
pub mod api {
    pub mod errors;
    pub mod events;
    pub mod search;
}
