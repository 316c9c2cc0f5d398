pub mod interface;
pub mod llama_server;
pub mod factory;

pub use interface::*;
pub use llama_server::LlamaServerModel;
pub use factory::ModelFactory;
