//! Postal addresses.
//!
//! Addresses are identified by their user-defined `key`. The remote also
//! assigns an id, but the record never exposes it: shipping/billing lists
//! and default pointers refer to addresses by key.

use commerce_diff::Keyed;
use commerce_types::Attr;
use serde::{Deserialize, Serialize};

/// A configured or stored address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub key: String,
    pub country: String,
    #[serde(default)]
    pub title: Attr<String>,
    #[serde(default)]
    pub salutation: Attr<String>,
    #[serde(default)]
    pub first_name: Attr<String>,
    #[serde(default)]
    pub last_name: Attr<String>,
    #[serde(default)]
    pub street_name: Attr<String>,
    #[serde(default)]
    pub street_number: Attr<String>,
    #[serde(default)]
    pub additional_street_info: Attr<String>,
    #[serde(default)]
    pub postal_code: Attr<String>,
    #[serde(default)]
    pub city: Attr<String>,
    #[serde(default)]
    pub region: Attr<String>,
    #[serde(default)]
    pub state: Attr<String>,
    #[serde(default)]
    pub company: Attr<String>,
    #[serde(default)]
    pub department: Attr<String>,
    #[serde(default)]
    pub building: Attr<String>,
    #[serde(default)]
    pub apartment: Attr<String>,
    #[serde(default)]
    pub po_box: Attr<String>,
    #[serde(default)]
    pub phone: Attr<String>,
    #[serde(default)]
    pub mobile: Attr<String>,
    #[serde(default)]
    pub email: Attr<String>,
    #[serde(default)]
    pub additional_address_info: Attr<String>,
    #[serde(default)]
    pub external_id: Attr<String>,
}

impl Keyed for Address {
    fn key(&self) -> &str {
        &self.key
    }
}

impl Address {
    pub fn new(key: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Attr::known(city.into());
        self
    }

    #[must_use]
    pub fn with_street(mut self, name: impl Into<String>, number: impl Into<String>) -> Self {
        self.street_name = Attr::known(name.into());
        self.street_number = Attr::known(number.into());
        self
    }

    /// Remote shape of this address, without an id.
    #[must_use]
    pub fn to_remote(&self) -> RemoteAddress {
        RemoteAddress {
            id: None,
            key: Some(self.key.clone()),
            country: self.country.clone(),
            title: self.title.to_option(),
            salutation: self.salutation.to_option(),
            first_name: self.first_name.to_option(),
            last_name: self.last_name.to_option(),
            street_name: self.street_name.to_option(),
            street_number: self.street_number.to_option(),
            additional_street_info: self.additional_street_info.to_option(),
            postal_code: self.postal_code.to_option(),
            city: self.city.to_option(),
            region: self.region.to_option(),
            state: self.state.to_option(),
            company: self.company.to_option(),
            department: self.department.to_option(),
            building: self.building.to_option(),
            apartment: self.apartment.to_option(),
            p_o_box: self.po_box.to_option(),
            phone: self.phone.to_option(),
            mobile: self.mobile.to_option(),
            email: self.email.to_option(),
            additional_address_info: self.additional_address_info.to_option(),
            external_id: self.external_id.to_option(),
        }
    }

    /// Record shape of a remote address. Addresses without a key get an empty one.
    #[must_use]
    pub fn from_remote(remote: &RemoteAddress) -> Self {
        Self {
            key: remote.key.clone().unwrap_or_default(),
            country: remote.country.clone(),
            title: remote.title.clone().into(),
            salutation: remote.salutation.clone().into(),
            first_name: remote.first_name.clone().into(),
            last_name: remote.last_name.clone().into(),
            street_name: remote.street_name.clone().into(),
            street_number: remote.street_number.clone().into(),
            additional_street_info: remote.additional_street_info.clone().into(),
            postal_code: remote.postal_code.clone().into(),
            city: remote.city.clone().into(),
            region: remote.region.clone().into(),
            state: remote.state.clone().into(),
            company: remote.company.clone().into(),
            department: remote.department.clone().into(),
            building: remote.building.clone().into(),
            apartment: remote.apartment.clone().into(),
            po_box: remote.p_o_box.clone().into(),
            phone: remote.phone.clone().into(),
            mobile: remote.mobile.clone().into(),
            email: remote.email.clone().into(),
            additional_address_info: remote.additional_address_info.clone().into(),
            external_id: remote.external_id.clone().into(),
        }
    }
}

/// An address as exchanged with the commerce API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_street_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(rename = "pOBox", default, skip_serializing_if = "Option::is_none")]
    pub p_o_box: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_address_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl RemoteAddress {
    /// Same address content, ignoring the server-assigned id.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.id = other.id.clone();
        a == *other
    }
}
