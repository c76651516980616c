pub mod demo;
pub mod node_args;
pub mod show_config;
pub mod test_rpc;
