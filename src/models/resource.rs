//! Resource types accepted by the show endpoint.

use std::fmt;

use clap::ValueEnum;

/// Reference entities that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceType {
    /// Agents and end users.
    #[value(name = "users")]
    Users,
    /// Ticket field definitions.
    #[value(name = "ticket_fields")]
    TicketFields,
    /// Brands.
    #[value(name = "brands")]
    Brands,
    /// Organizations.
    #[value(name = "organizations")]
    Organizations,
    /// Agent groups.
    #[value(name = "groups")]
    Groups,
}

impl ResourceType {
    /// Path segment under `/api/v2/`.
    pub fn as_path(&self) -> &'static str {
        match self {
            ResourceType::Users => "users",
            ResourceType::TicketFields => "ticket_fields",
            ResourceType::Brands => "brands",
            ResourceType::Organizations => "organizations",
            ResourceType::Groups => "groups",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}
