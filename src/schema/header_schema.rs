//! The fixed header schema, shared by every table.
//!
//! These message types are the wire contract for the header record. They are
//! defined once at compile time through `prost` derives; field tags must never be
//! renumbered.

use prost::Message;

/// The header record payload: column definitions plus table metadata.
#[derive(Clone, PartialEq, Message)]
pub struct HeaderMessage {
    #[prost(message, repeated, tag = "1")]
    pub header: Vec<ColumnMessage>,

    #[prost(message, optional, tag = "2")]
    pub meta: Option<MetaMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ColumnMessage {
    #[prost(string, tag = "1")]
    pub name: String,

    /// One of `string`, `uint`, `int`, `float`, `bool`.
    #[prost(string, tag = "2")]
    pub r#type: String,

    #[prost(message, optional, tag = "3")]
    pub transform: Option<TransformMessage>,

    #[prost(message, optional, tag = "4")]
    pub stats: Option<StatsMessage>,
}

/// Transform parameters. Unset fields take the transform defaults on decode.
#[derive(Clone, PartialEq, Message)]
pub struct TransformMessage {
    #[prost(double, optional, tag = "1")]
    pub offset: Option<f64>,

    #[prost(double, optional, tag = "2")]
    pub multip: Option<f64>,

    #[prost(sint32, optional, tag = "3")]
    pub decimals: Option<i32>,

    #[prost(bool, optional, tag = "4")]
    pub sequence: Option<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct StatsMessage {
    #[prost(double, tag = "1")]
    pub start: f64,
    #[prost(double, tag = "2")]
    pub end: f64,
    #[prost(double, tag = "3")]
    pub min: f64,
    #[prost(double, tag = "4")]
    pub max: f64,
    #[prost(double, tag = "5")]
    pub mean: f64,
    #[prost(uint64, optional, tag = "6")]
    pub count: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MetaMessage {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,

    #[prost(string, optional, tag = "2")]
    pub owner: Option<String>,

    #[prost(string, optional, tag = "3")]
    pub link: Option<String>,

    #[prost(string, optional, tag = "4")]
    pub comment: Option<String>,

    #[prost(uint32, optional, tag = "5")]
    pub row_count: Option<u32>,
}
