//! The subset of the `authzed.api.v1` messages that [`super::SchemaClient`]
//! speaks. Field tags match the upstream protobuf definitions.

#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct ZedToken {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteSchemaRequest {
    #[prost(string, tag = "1")]
    pub schema: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteSchemaResponse {
    #[prost(message, optional, tag = "1")]
    pub written_at: Option<ZedToken>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct ReadSchemaRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadSchemaResponse {
    #[prost(string, tag = "1")]
    pub schema_text: String,
    #[prost(message, optional, tag = "2")]
    pub read_at: Option<ZedToken>,
}

#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct ObjectReference {
    #[prost(string, tag = "1")]
    pub object_type: String,
    #[prost(string, tag = "2")]
    pub object_id: String,
}

impl ObjectReference {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SubjectReference {
    #[prost(message, optional, tag = "1")]
    pub object: Option<ObjectReference>,
    #[prost(string, tag = "2")]
    pub optional_relation: String,
}

impl From<ObjectReference> for SubjectReference {
    fn from(object: ObjectReference) -> Self {
        Self {
            object: Some(object),
            optional_relation: String::new(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Relationship {
    #[prost(message, optional, tag = "1")]
    pub resource: Option<ObjectReference>,
    #[prost(string, tag = "2")]
    pub relation: String,
    #[prost(message, optional, tag = "3")]
    pub subject: Option<SubjectReference>,
}

impl Relationship {
    pub fn new(
        resource: ObjectReference,
        relation: impl Into<String>,
        subject: impl Into<SubjectReference>,
    ) -> Self {
        Self {
            resource: Some(resource),
            relation: relation.into(),
            subject: Some(subject.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Operation {
    Unspecified = 0,
    Create = 1,
    Touch = 2,
    Delete = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RelationshipUpdate {
    #[prost(enumeration = "Operation", tag = "1")]
    pub operation: i32,
    #[prost(message, optional, tag = "2")]
    pub relationship: Option<Relationship>,
}

impl RelationshipUpdate {
    pub fn new(operation: Operation, relationship: Relationship) -> Self {
        Self {
            operation: operation.into(),
            relationship: Some(relationship),
        }
    }

    pub fn create(relationship: Relationship) -> Self {
        Self::new(Operation::Create, relationship)
    }

    pub fn touch(relationship: Relationship) -> Self {
        Self::new(Operation::Touch, relationship)
    }

    pub fn delete(relationship: Relationship) -> Self {
        Self::new(Operation::Delete, relationship)
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteRelationshipsRequest {
    #[prost(message, repeated, tag = "1")]
    pub updates: Vec<RelationshipUpdate>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteRelationshipsResponse {
    #[prost(message, optional, tag = "1")]
    pub written_at: Option<ZedToken>,
}

#[cfg(test)]
mod test {
    use prost::Message as _;

    use super::*;

    #[test]
    fn test_relationship_update_wire_format() {
        let update = RelationshipUpdate::create(Relationship::new(
            ObjectReference::new("platform", "testplatform"),
            "administrator",
            ObjectReference::new("user", "testuser"),
        ));

        let decoded =
            RelationshipUpdate::decode(update.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.operation(), Operation::Create);
        assert_eq!(decoded, update);

        // field 1, varint, OPERATION_CREATE
        assert_eq!(&update.encode_to_vec()[..2], [0x08, 0x01]);
    }

    #[test]
    fn test_empty_request_encodes_to_nothing() {
        assert!(ReadSchemaRequest {}.encode_to_vec().is_empty());
    }
}
