pub mod decoders;
pub mod gmail_client;
pub mod mime;
