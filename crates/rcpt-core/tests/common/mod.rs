pub mod receipt_server;
