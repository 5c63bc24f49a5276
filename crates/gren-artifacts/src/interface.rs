//! Public signatures of compiled modules.

use crate::codec::{CodecError, Decode, Encode, Reader, Writer};
use gren_core::{CanonicalModule, PackageName};
use std::collections::BTreeMap;

/// A canonical type as it appears in an interface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Type {
    /// A type variable.
    Var(String),
    /// A function type.
    Lambda(Box<Type>, Box<Type>),
    /// A named type with arguments, pinned to its defining module.
    Named(CanonicalModule, String, Vec<Type>),
    /// A record with closed fields.
    Record(BTreeMap<String, Type>),
    /// The unit type.
    Unit,
}

/// The exported type of a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Free type variables, in order of appearance.
    pub vars: Vec<String>,
    /// The value's type.
    pub tipe: Type,
}

/// An exported custom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Union {
    /// Type parameters.
    pub vars: Vec<String>,
    /// Constructors; empty when the type is exported opaquely.
    pub ctors: Vec<(String, Vec<Type>)>,
}

impl Union {
    /// The same union with its constructors hidden.
    #[must_use]
    pub fn opaque(&self) -> Self {
        Self {
            vars: self.vars.clone(),
            ctors: Vec::new(),
        }
    }
}

/// An exported type alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Type parameters.
    pub vars: Vec<String>,
    /// The aliased type.
    pub tipe: Type,
}

/// The public signature of one compiled module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// The package that compiled the module.
    pub home: PackageName,
    /// Exported values and their annotations.
    pub values: BTreeMap<String, Annotation>,
    /// Exported custom types.
    pub unions: BTreeMap<String, Union>,
    /// Exported type aliases.
    pub aliases: BTreeMap<String, Alias>,
}

impl Interface {
    /// An empty interface owned by `home`.
    #[must_use]
    pub fn new(home: PackageName) -> Self {
        Self {
            home,
            values: BTreeMap::new(),
            unions: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }
}

/// A dependency module's interface, as seen across a package boundary.
///
/// Direct dependencies are `Public`: user code may reference their values.
/// Everything further out is `Private`: values and constructors are gone,
/// but type structure stays so types can still be compared for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyInterface {
    /// Fully visible interface of a direct dependency.
    Public(Interface),
    /// Privatized view of a transitive dependency's module.
    Private(PackageName, BTreeMap<String, Union>, BTreeMap<String, Alias>),
}

impl DependencyInterface {
    /// The privatizing transform applied to transitive dependencies.
    #[must_use]
    pub fn privatize(interface: &Interface) -> Self {
        let unions = interface
            .unions
            .iter()
            .map(|(name, union)| (name.clone(), union.opaque()))
            .collect();
        Self::Private(
            interface.home.clone(),
            unions,
            interface.aliases.clone(),
        )
    }

    /// The full interface, only available across a direct dependency edge.
    #[must_use]
    pub fn public(&self) -> Option<&Interface> {
        match self {
            Self::Public(interface) => Some(interface),
            Self::Private(..) => None,
        }
    }
}

impl Encode for Type {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Self::Var(name) => {
                writer.put_u8(0);
                name.encode(writer);
            }
            Self::Lambda(arg, result) => {
                writer.put_u8(1);
                arg.encode(writer);
                result.encode(writer);
            }
            Self::Named(home, name, args) => {
                writer.put_u8(2);
                home.encode(writer);
                name.encode(writer);
                args.encode(writer);
            }
            Self::Record(fields) => {
                writer.put_u8(3);
                fields.encode(writer);
            }
            Self::Unit => writer.put_u8(4),
        }
    }
}

impl Decode for Type {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(Self::Var(String::decode(reader)?)),
            1 => Ok(Self::Lambda(
                Box::new(Self::decode(reader)?),
                Box::new(Self::decode(reader)?),
            )),
            2 => Ok(Self::Named(
                CanonicalModule::decode(reader)?,
                String::decode(reader)?,
                Vec::decode(reader)?,
            )),
            3 => Ok(Self::Record(BTreeMap::decode(reader)?)),
            4 => Ok(Self::Unit),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "Type",
                at,
            }),
        }
    }
}

impl Encode for Annotation {
    fn encode(&self, writer: &mut Writer) {
        self.vars.encode(writer);
        self.tipe.encode(writer);
    }
}

impl Decode for Annotation {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            vars: Vec::decode(reader)?,
            tipe: Type::decode(reader)?,
        })
    }
}

impl Encode for Union {
    fn encode(&self, writer: &mut Writer) {
        self.vars.encode(writer);
        self.ctors.encode(writer);
    }
}

impl Decode for Union {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            vars: Vec::decode(reader)?,
            ctors: Vec::decode(reader)?,
        })
    }
}

impl Encode for Alias {
    fn encode(&self, writer: &mut Writer) {
        self.vars.encode(writer);
        self.tipe.encode(writer);
    }
}

impl Decode for Alias {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            vars: Vec::decode(reader)?,
            tipe: Type::decode(reader)?,
        })
    }
}

impl Encode for Interface {
    fn encode(&self, writer: &mut Writer) {
        self.home.encode(writer);
        self.values.encode(writer);
        self.unions.encode(writer);
        self.aliases.encode(writer);
    }
}

impl Decode for Interface {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            home: PackageName::decode(reader)?,
            values: BTreeMap::decode(reader)?,
            unions: BTreeMap::decode(reader)?,
            aliases: BTreeMap::decode(reader)?,
        })
    }
}

impl Encode for DependencyInterface {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Self::Public(interface) => {
                writer.put_u8(0);
                interface.encode(writer);
            }
            Self::Private(home, unions, aliases) => {
                writer.put_u8(1);
                home.encode(writer);
                unions.encode(writer);
                aliases.encode(writer);
            }
        }
    }
}

impl Decode for DependencyInterface {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let at = reader.position();
        match reader.get_u8()? {
            0 => Ok(Self::Public(Interface::decode(reader)?)),
            1 => Ok(Self::Private(
                PackageName::decode(reader)?,
                BTreeMap::decode(reader)?,
                BTreeMap::decode(reader)?,
            )),
            tag => Err(CodecError::UnknownTag {
                tag,
                what: "DependencyInterface",
                at,
            }),
        }
    }
}
