pub mod config;
pub mod dashboard;
pub mod feed;
pub mod links;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod view;
pub mod window;
