//! Messages of the `mayastor.Mayastor` storage node service
//!
//! Only the messages and fields the query layer reads are declared; prost
//! skips unknown fields, so the subset decodes replies from any data plane
//! release that keeps these tags.
//!
//! Field tags and enum values mirror `protobuf/mayastor.proto` of
//! openebs/mayastor-api on the v1.0 release line (package `mayastor`), the
//! file `rpc/build.rs` of the control plane compiles with tonic-build.

/// Empty request/reply
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Null {}

// =============================================================================
// Pools
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PoolState {
    PoolUnknown = 0,
    PoolOnline = 1,
    PoolDegraded = 2,
    PoolFaulted = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Pool {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub disks: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(enumeration = "PoolState", tag = "3")]
    pub state: i32,
    #[prost(uint64, tag = "5")]
    pub capacity: u64,
    #[prost(uint64, tag = "6")]
    pub used: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPoolsReply {
    #[prost(message, repeated, tag = "1")]
    pub pools: ::prost::alloc::vec::Vec<Pool>,
}

// =============================================================================
// Replicas
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ShareProtocolReplica {
    ReplicaNone = 0,
    ReplicaNvmf = 1,
    ReplicaIscsi = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Replica {
    #[prost(string, tag = "1")]
    pub uuid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub pool: ::prost::alloc::string::String,
    #[prost(bool, tag = "3")]
    pub thin: bool,
    #[prost(uint64, tag = "4")]
    pub size: u64,
    #[prost(enumeration = "ShareProtocolReplica", tag = "5")]
    pub share: i32,
    #[prost(string, tag = "6")]
    pub uri: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListReplicasReply {
    #[prost(message, repeated, tag = "1")]
    pub replicas: ::prost::alloc::vec::Vec<Replica>,
}

// =============================================================================
// Nexus
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChildState {
    ChildUnknown = 0,
    ChildOnline = 1,
    ChildDegraded = 2,
    ChildFaulted = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum NexusState {
    NexusUnknown = 0,
    NexusOnline = 1,
    NexusDegraded = 2,
    NexusFaulted = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Child {
    #[prost(string, tag = "1")]
    pub uri: ::prost::alloc::string::String,
    #[prost(enumeration = "ChildState", tag = "2")]
    pub state: i32,
    /// Percentage, -1 when not rebuilding
    #[prost(int32, tag = "3")]
    pub rebuild_progress: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NexusV2 {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub uuid: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub size: u64,
    #[prost(enumeration = "NexusState", tag = "4")]
    pub state: i32,
    #[prost(message, repeated, tag = "5")]
    pub children: ::prost::alloc::vec::Vec<Child>,
    #[prost(string, tag = "6")]
    pub device_uri: ::prost::alloc::string::String,
    #[prost(uint32, tag = "7")]
    pub rebuilds: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListNexusV2Reply {
    #[prost(message, repeated, tag = "1")]
    pub nexus_list: ::prost::alloc::vec::Vec<NexusV2>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FaultNexusChildRequest {
    #[prost(string, tag = "1")]
    pub uuid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub uri: ::prost::alloc::string::String,
}

// =============================================================================
// NVMe Controllers
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum NvmeControllerState {
    New = 0,
    Initializing = 1,
    Running = 2,
    Faulted = 3,
    Unconfiguring = 4,
    Unconfigured = 5,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NvmeController {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(enumeration = "NvmeControllerState", tag = "2")]
    pub state: i32,
    #[prost(uint64, tag = "3")]
    pub size: u64,
    #[prost(uint32, tag = "4")]
    pub blk_size: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListNvmeControllersResponse {
    #[prost(message, repeated, tag = "1")]
    pub controllers: ::prost::alloc::vec::Vec<NvmeController>,
}

// =============================================================================
// Service Info
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MayastorInfoResponse {
    #[prost(string, tag = "1")]
    pub version: ::prost::alloc::string::String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_nexus_decode_skips_unknown_fields() {
        let nexus = NexusV2 {
            name: "nexus-1".into(),
            uuid: "ec4e66fd".into(),
            size: 1 << 30,
            state: NexusState::NexusDegraded as i32,
            children: vec![Child {
                uri: "bdev:///ec4e66fd".into(),
                state: ChildState::ChildFaulted as i32,
                rebuild_progress: -1,
            }],
            device_uri: String::new(),
            rebuilds: 0,
        };
        let mut bytes = nexus.encode_to_vec();
        // field 15, varint 1, unknown to this subset
        bytes.extend_from_slice(&[0x78, 0x01]);

        let decoded = NexusV2::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, nexus);
        assert_eq!(decoded.state(), NexusState::NexusDegraded);
        assert_eq!(decoded.children[0].state(), ChildState::ChildFaulted);
    }
}
