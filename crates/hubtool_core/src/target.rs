use crate::model::ContentItem;

/// Which body field a run strips from archived items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalTarget {
    /// Clear `_meta.deliveryKey`, then re-archive the item.
    DeliveryKey,
    /// Clear `active` on previously published items, then queue a publish.
    /// The item is left ACTIVE.
    ActiveFlag,
}

impl RemovalTarget {
    pub fn command_name(self) -> &'static str {
        match self {
            Self::DeliveryKey => "remove-archived-delivery-key",
            Self::ActiveFlag => "remove-archived-active-flag",
        }
    }

    pub fn action_name(self) -> &'static str {
        match self {
            Self::DeliveryKey => "REMOVE-DELIVERY-KEY",
            Self::ActiveFlag => "REMOVE-ACTIVE-FLAG",
        }
    }

    pub fn log_title(self) -> &'static str {
        match self {
            Self::DeliveryKey => "Remove delivery keys from archived content items",
            Self::ActiveFlag => "Remove active flag from archived content items",
        }
    }

    pub fn field_label(self) -> &'static str {
        match self {
            Self::DeliveryKey => "delivery key",
            Self::ActiveFlag => "active flag",
        }
    }

    pub fn carries_field(self, item: &ContentItem) -> bool {
        match self {
            Self::DeliveryKey => item.delivery_key().is_some(),
            Self::ActiveFlag => item.is_active_flag_set() && item.last_published_version.is_some(),
        }
    }

    /// Value recorded in the audit log before the field is cleared.
    pub fn captured_value(self, item: &ContentItem) -> Option<String> {
        match self {
            Self::DeliveryKey => item.delivery_key().map(str::to_string),
            Self::ActiveFlag => None,
        }
    }

    pub fn clear_field(self, item: &mut ContentItem) {
        match self {
            Self::DeliveryKey => item.body.meta.delivery_key = None,
            Self::ActiveFlag => item.body.active = Some(false),
        }
    }
}
