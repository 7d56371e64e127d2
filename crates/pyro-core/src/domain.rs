//! # Wire-Token Vocabularies
//!
//! Every closed vocabulary the portal exchanges with the REST backend is a
//! Rust enum whose serde name is the exact wire token. Adding a variant
//! forces every exhaustive `match` in the workspace to handle it.
//!
//! | Enum | Tokens |
//! |------|--------|
//! | [`ApplicationType`] | `permit`, `license` |
//! | [`LicenseType`] | `importer`, `storage`, `wholesale`, `retail` |
//! | [`Role`] | `admin`, `user`, `inspector` |
//! | [`Service`] | `applications`, `documents`, `users` |
//! | [`Action`] | `create`, `view`, `download`, `revoke`, `edit`, `approve`, `reject`, `review`, `delete`, `*` |
//! | [`ApplicantType`] | `individual`, `business` |
//! | [`EntityType`] | `sole_proprietorship`, `partnership`, `corporation`, `llc` |
//! | [`EventType`] | `public_display`, `private_display`, `proximate` |
//! | [`DocumentType`] | see enum |

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Declares a wire-token enum with `as_str`, `ALL`, `Display`, and a
/// `FromStr` that rejects unknown tokens with [`ValidationError::UnknownToken`].
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $token)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire token for this variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $token, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok(Self::$variant), )+
                    other => Err(ValidationError::UnknownToken {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Discriminator between the two application families.
    pub enum ApplicationType as "application type" {
        /// Event-scoped authorization for a fireworks display.
        Permit => "permit",
        /// Entity-scoped authorization to handle fireworks commercially.
        License => "license",
    }
}

wire_enum! {
    /// License sub-type. Determines which site fields are required.
    pub enum LicenseType as "license type" {
        Importer => "importer",
        Storage => "storage",
        Wholesale => "wholesale",
        Retail => "retail",
    }
}

impl LicenseType {
    /// Whether a physical site (business name and phone) must be declared.
    ///
    /// Importers operate through a port of entry and declare no site.
    pub fn requires_site(&self) -> bool {
        !matches!(self, Self::Importer)
    }
}

wire_enum! {
    /// Portal role carried by an account.
    pub enum Role as "role" {
        Admin => "admin",
        User => "user",
        Inspector => "inspector",
    }
}

wire_enum! {
    /// Backend resource family that permissions are scoped to.
    pub enum Service as "service" {
        Applications => "applications",
        Documents => "documents",
        Users => "users",
    }
}

wire_enum! {
    /// Action token granted by the permission table.
    ///
    /// [`Action::All`] (`*`) grants every action for its service/role pair.
    pub enum Action as "action" {
        Create => "create",
        View => "view",
        Download => "download",
        Revoke => "revoke",
        Edit => "edit",
        Approve => "approve",
        Reject => "reject",
        Review => "review",
        Delete => "delete",
        All => "*",
    }
}

wire_enum! {
    /// Whether a license applicant is a natural person or a business.
    pub enum ApplicantType as "applicant type" {
        Individual => "individual",
        Business => "business",
    }
}

wire_enum! {
    /// Legal form of a business applicant.
    pub enum EntityType as "entity type" {
        SoleProprietorship => "sole_proprietorship",
        Partnership => "partnership",
        Corporation => "corporation",
        LimitedLiabilityCompany => "llc",
    }
}

wire_enum! {
    /// Kind of display a permit authorizes.
    pub enum EventType as "event type" {
        PublicDisplay => "public_display",
        PrivateDisplay => "private_display",
        /// Indoor or close-proximity pyrotechnics before an audience.
        Proximate => "proximate",
    }
}

wire_enum! {
    /// Key of an entry in an application's `DocumentsUploaded` map.
    pub enum DocumentType as "document type" {
        CertificateOfInsurance => "certificate_of_insurance",
        SitePlan => "site_plan",
        DisplayOperatorLicense => "display_operator_license",
        BusinessRegistration => "business_registration",
        FireMarshalApproval => "fire_marshal_approval",
        /// Proof of fee payment; must exist before an application is approved.
        PaymentCheck => "payment_check",
    }
}

impl DocumentType {
    /// Human-readable label used by viewers and printable artifacts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CertificateOfInsurance => "Certificate of Insurance",
            Self::SitePlan => "Site Plan",
            Self::DisplayOperatorLicense => "Display Operator License",
            Self::BusinessRegistration => "Business Registration",
            Self::FireMarshalApproval => "Fire Marshal Approval",
            Self::PaymentCheck => "Payment Check",
        }
    }
}
