pub mod decoders;
pub mod fetch;
pub mod gateway;
pub mod imap_client;
pub mod mime;
pub mod smtp;
