//! Declarative description of the persisted model
//!
//! Two entities, one relationship. Backends use it to decide what a delete
//! does to related rows; the SQLite migration is checked against it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Uuid,
    Date,
    String,
    Double,
    Integer32,
    Boolean,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribute {
    /// Persisted (snake_case) column name
    pub name: &'static str,
    pub ty: AttributeType,
    pub optional: bool,
    /// Default written when the caller supplies nothing
    pub default: Option<DefaultValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Double(f64),
    Integer(i64),
    Bool(bool),
    Text(&'static str),
}

/// What deleting the source record does to the records on the other side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRule {
    /// Delete the related records in the same transaction
    Cascade,
    /// Clear the back-reference on the related records
    Nullify,
    /// Refuse the delete while related records exist
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relationship {
    pub name: &'static str,
    pub source: &'static str,
    pub destination: &'static str,
    pub to_many: bool,
    pub delete_rule: DeleteRule,
    pub inverse: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub name: &'static str,
    /// Backing table name
    pub table: &'static str,
    pub attributes: &'static [Attribute],
}

const fn attr(name: &'static str, ty: AttributeType, optional: bool) -> Attribute {
    Attribute {
        name,
        ty,
        optional,
        default: None,
    }
}

const fn attr_default(name: &'static str, ty: AttributeType, default: DefaultValue) -> Attribute {
    Attribute {
        name,
        ty,
        optional: false,
        default: Some(default),
    }
}

pub const SESSION: Entity = Entity {
    name: "SurfSession",
    table: "sessions",
    attributes: &[
        attr("id", AttributeType::Uuid, false),
        attr("start_date", AttributeType::Date, false),
        attr("end_date", AttributeType::Date, true),
        attr_default("location", AttributeType::String, DefaultValue::Text("")),
        attr_default("latitude", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("longitude", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("total_waves", AttributeType::Integer32, DefaultValue::Integer(0)),
        attr_default("max_speed", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("avg_heart_rate", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("distance_surfed", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("distance_paddled", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("stroke_count", AttributeType::Integer32, DefaultValue::Integer(0)),
        attr("notes", AttributeType::String, true),
        attr_default("is_uploaded", AttributeType::Boolean, DefaultValue::Bool(false)),
    ],
};

pub const WAVE: Entity = Entity {
    name: "Wave",
    table: "waves",
    attributes: &[
        attr("id", AttributeType::Uuid, false),
        attr("session_id", AttributeType::Uuid, false),
        attr("start_time", AttributeType::Date, false),
        attr("end_time", AttributeType::Date, false),
        attr_default("distance", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("duration", AttributeType::Double, DefaultValue::Double(0.0)),
        attr_default("max_speed", AttributeType::Double, DefaultValue::Double(0.0)),
        attr("coordinates", AttributeType::Binary, false),
        attr_default("confidence", AttributeType::Double, DefaultValue::Double(1.0)),
    ],
};

/// `Session.waves`: deleting a session deletes its waves
pub const SESSION_WAVES: Relationship = Relationship {
    name: "waves",
    source: "SurfSession",
    destination: "Wave",
    to_many: true,
    delete_rule: DeleteRule::Cascade,
    inverse: "session",
};

/// `Wave.session`: deleting a wave only detaches it from its session
pub const WAVE_SESSION: Relationship = Relationship {
    name: "session",
    source: "Wave",
    destination: "SurfSession",
    to_many: false,
    delete_rule: DeleteRule::Nullify,
    inverse: "waves",
};

pub const ENTITIES: [Entity; 2] = [SESSION, WAVE];
pub const RELATIONSHIPS: [Relationship; 2] = [SESSION_WAVES, WAVE_SESSION];

impl Entity {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(|a| !a.optional && a.default.is_none())
    }
}
