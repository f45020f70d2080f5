pub mod anchor;
pub mod bucket;
pub mod site;
