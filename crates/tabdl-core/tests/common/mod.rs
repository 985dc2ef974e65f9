pub mod tab_server;
