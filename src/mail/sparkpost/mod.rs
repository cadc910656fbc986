pub mod client;
pub mod transmission;
pub mod transport;

pub use client::{
    HttpTransmissionClient, RecordingClient, TransmissionClient, TransmissionResponse,
    TransmissionResults,
};
pub use transmission::{Address, Content, Recipient, Transmission, TransmissionAttachment};
pub use transport::SparkPostTransport;
