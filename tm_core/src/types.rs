/// Extra `network={}` fields in insertion order. Re-inserting a name
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields(Vec<(String, String)>);

impl ExtraFields {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything needed to write one supplicant network block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredential {
    pub ssid: String,
    /// Empty means an open network.
    pub passkey: String,
    pub country: String,
    pub extra: ExtraFields,
}

impl WifiCredential {
    pub fn new(
        ssid: impl Into<String>,
        passkey: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            passkey: passkey.into(),
            country: country.into(),
            extra: ExtraFields::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.passkey.is_empty()
    }

    /// Record an extra field. `country` updates the country code instead.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name == "country" {
            self.country = value.into();
        } else {
            self.extra.insert(name, value);
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }
}
