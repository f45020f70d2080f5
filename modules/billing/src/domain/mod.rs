pub mod catalog;
pub mod cycle;
pub mod error;
pub mod ports;
pub mod repo;
pub mod resolver;
pub mod service;
