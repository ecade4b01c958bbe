//! Resource descriptors for the networking-sfc object kinds.
//!
//! A [`Descriptor`] is static metadata: which fields are compared how, which
//! fields reference other objects, and which fields a create cannot do without.
//! The reconciliation engine is generic over these tables.

use std::fmt;

/// Kinds of objects reachable through the remote store.
///
/// `Port` is only ever looked up; the other four are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Port,
    FlowClassifier,
    PortPair,
    PortPairGroup,
    PortChain,
}

impl ObjectKind {
    /// Singular key used in API bodies (`{"port_pair": {...}}`).
    pub fn singular(&self) -> &'static str {
        match self {
            ObjectKind::Port => "port",
            ObjectKind::FlowClassifier => "flow_classifier",
            ObjectKind::PortPair => "port_pair",
            ObjectKind::PortPairGroup => "port_pair_group",
            ObjectKind::PortChain => "port_chain",
        }
    }

    /// Plural key used in list responses (`{"port_pairs": [...]}`).
    pub fn plural(&self) -> &'static str {
        match self {
            ObjectKind::Port => "ports",
            ObjectKind::FlowClassifier => "flow_classifiers",
            ObjectKind::PortPair => "port_pairs",
            ObjectKind::PortPairGroup => "port_pair_groups",
            ObjectKind::PortChain => "port_chains",
        }
    }

    /// Collection path relative to the network endpoint.
    pub fn collection_path(&self) -> &'static str {
        match self {
            ObjectKind::Port => "/v2.0/ports",
            ObjectKind::FlowClassifier => "/v2.0/sfc/flow_classifiers",
            ObjectKind::PortPair => "/v2.0/sfc/port_pairs",
            ObjectKind::PortPairGroup => "/v2.0/sfc/port_pair_groups",
            ObjectKind::PortChain => "/v2.0/sfc/port_chains",
        }
    }

    /// The reconcilable kind behind this object kind, if any.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            ObjectKind::Port => None,
            ObjectKind::FlowClassifier => Some(ResourceKind::FlowClassifier),
            ObjectKind::PortPair => Some(ResourceKind::PortPair),
            ObjectKind::PortPairGroup => Some(ResourceKind::PortPairGroup),
            ObjectKind::PortChain => Some(ResourceKind::PortChain),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectKind::Port => "port",
            ObjectKind::FlowClassifier => "flow classifier",
            ObjectKind::PortPair => "port pair",
            ObjectKind::PortPairGroup => "port pair group",
            ObjectKind::PortChain => "port chain",
        };
        f.write_str(s)
    }
}

/// Kinds of resources the engine reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    FlowClassifier,
    PortPair,
    PortPairGroup,
    PortChain,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::FlowClassifier,
        ResourceKind::PortPair,
        ResourceKind::PortPairGroup,
        ResourceKind::PortChain,
    ];

    pub fn descriptor(&self) -> &'static Descriptor {
        match self {
            ResourceKind::FlowClassifier => &FLOW_CLASSIFIER,
            ResourceKind::PortPair => &PORT_PAIR,
            ResourceKind::PortPairGroup => &PORT_PAIR_GROUP,
            ResourceKind::PortChain => &PORT_CHAIN,
        }
    }

    pub fn object_kind(&self) -> ObjectKind {
        match self {
            ResourceKind::FlowClassifier => ObjectKind::FlowClassifier,
            ResourceKind::PortPair => ObjectKind::PortPair,
            ResourceKind::PortPairGroup => ObjectKind::PortPairGroup,
            ResourceKind::PortChain => ObjectKind::PortChain,
        }
    }

    /// Key under which the resulting object is reported (`port_chain`).
    pub fn key(&self) -> &'static str {
        self.object_kind().singular()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.object_kind().fmt(f)
    }
}

/// Whether a reference field holds one ID or a list of IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A field whose user value names another object.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub field: &'static str,
    pub target: ObjectKind,
    pub cardinality: Cardinality,
}

/// Static description of one resource kind.
#[derive(Debug)]
pub struct Descriptor {
    pub kind: ResourceKind,
    /// Compared by direct equality.
    pub scalar_fields: &'static [&'static str],
    /// Compared by structural equality of the whole mapping.
    pub dict_fields: &'static [&'static str],
    /// Compared as unordered sets of resolved IDs.
    pub list_ref_fields: &'static [&'static str],
    pub references: &'static [Reference],
    pub required_on_create: &'static [&'static str],
    /// Resolved reference fields included in every update payload.
    pub sent_on_every_update: &'static [&'static str],
}

impl Descriptor {
    pub fn reference(&self, field: &str) -> Option<&'static Reference> {
        self.references.iter().find(|r| r.field == field)
    }

    pub fn is_scalar(&self, field: &str) -> bool {
        self.scalar_fields.contains(&field)
    }

    pub fn is_dict(&self, field: &str) -> bool {
        self.dict_fields.contains(&field)
    }

    pub fn is_list_ref(&self, field: &str) -> bool {
        self.list_ref_fields.contains(&field)
    }

    pub fn is_known(&self, field: &str) -> bool {
        self.is_scalar(field) || self.is_dict(field) || self.is_list_ref(field)
    }

    /// All comparable fields in table order: scalars, dicts, then lists.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        self.scalar_fields
            .iter()
            .chain(self.dict_fields)
            .chain(self.list_ref_fields)
            .copied()
    }
}

const fn port_ref(field: &'static str) -> Reference {
    Reference {
        field,
        target: ObjectKind::Port,
        cardinality: Cardinality::One,
    }
}

pub static FLOW_CLASSIFIER: Descriptor = Descriptor {
    kind: ResourceKind::FlowClassifier,
    scalar_fields: &[
        "description",
        "ethertype",
        "protocol",
        "source_port_range_min",
        "source_port_range_max",
        "destination_port_range_min",
        "destination_port_range_max",
        "source_ip_prefix",
        "destination_ip_prefix",
        "logical_source_port",
        "logical_destination_port",
    ],
    dict_fields: &["l7_parameters"],
    list_ref_fields: &[],
    references: &[
        port_ref("logical_source_port"),
        port_ref("logical_destination_port"),
    ],
    required_on_create: &[],
    sent_on_every_update: &[],
};

pub static PORT_PAIR: Descriptor = Descriptor {
    kind: ResourceKind::PortPair,
    scalar_fields: &["description", "ingress", "egress"],
    dict_fields: &["service_function_parameters"],
    list_ref_fields: &[],
    references: &[port_ref("ingress"), port_ref("egress")],
    required_on_create: &["ingress", "egress"],
    sent_on_every_update: &[],
};

pub static PORT_PAIR_GROUP: Descriptor = Descriptor {
    kind: ResourceKind::PortPairGroup,
    scalar_fields: &["description"],
    dict_fields: &["port_pair_group_parameters"],
    list_ref_fields: &["port_pairs"],
    references: &[Reference {
        field: "port_pairs",
        target: ObjectKind::PortPair,
        cardinality: Cardinality::Many,
    }],
    required_on_create: &["port_pairs"],
    sent_on_every_update: &[],
};

pub static PORT_CHAIN: Descriptor = Descriptor {
    kind: ResourceKind::PortChain,
    scalar_fields: &["description", "chain_id"],
    dict_fields: &["chain_parameters"],
    list_ref_fields: &["port_pair_groups", "flow_classifiers"],
    references: &[
        Reference {
            field: "port_pair_groups",
            target: ObjectKind::PortPairGroup,
            cardinality: Cardinality::Many,
        },
        Reference {
            field: "flow_classifiers",
            target: ObjectKind::FlowClassifier,
            cardinality: Cardinality::Many,
        },
    ],
    required_on_create: &["port_pair_groups", "flow_classifiers"],
    sent_on_every_update: &["port_pair_groups", "flow_classifiers"],
};
