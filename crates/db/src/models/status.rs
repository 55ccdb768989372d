//! Status helper enums mapping to Postgres `ENUM` types.
//!
//! Each variant's label is the exact enum value stored in the database and
//! the string used in JSON, so the two never drift apart.

use serde::{Deserialize, Serialize};

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $pg_type:tt {
            $( $(#[$vmeta:meta])* $variant:ident = $label:tt ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[sqlx(type_name = $pg_type)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                #[sqlx(rename = $label)]
                $variant
            ),+
        }

        impl $name {
            /// Return the database label.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Post lifecycle status. Only moves forward.
    PostStatus as "post_status" {
        /// Freshly submitted; no metadata yet.
        Init = "init",
        /// Metadata and rewritten content persisted; images pending.
        SubProcessed = "sub-processed",
        /// All images generated and uploaded. Terminal.
        Processed = "processed",
    }
}

define_status_enum! {
    /// Slot an image fills in its post.
    PostImageType as "post_image_type" {
        Banner = "banner",
        Section = "section",
    }
}

/// Statuses the dispatcher picks up.
pub const ELIGIBLE_POST_STATUSES: [PostStatus; 2] = [PostStatus::Init, PostStatus::SubProcessed];

impl PostStatus {
    /// Whether the dispatcher should hand a post in this status to a worker.
    pub fn is_eligible(self) -> bool {
        ELIGIBLE_POST_STATUSES.contains(&self)
    }
}

impl From<postpix_core::metadata::ImageKind> for PostImageType {
    fn from(kind: postpix_core::metadata::ImageKind) -> Self {
        match kind {
            postpix_core::metadata::ImageKind::Banner => Self::Banner,
            postpix_core::metadata::ImageKind::Section => Self::Section,
        }
    }
}
