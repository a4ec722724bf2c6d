pub mod media_server;
