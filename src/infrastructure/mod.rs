// Infrastructure layer module
// Storage adapters behind the domain repository ports

pub mod repositories;
