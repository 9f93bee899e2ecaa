/// SATS facilities in the Oslo area, as spelled on the booking portal
pub const SATS_LOCATIONS: &[&str] = &[
    "Akersgate",
    "Asker",
    "Bekkestua",
    "Bekkestua stasjon",
    "Billingstad",
    "Bislett",
    "Bjørvika",
    "CC Vest",
    "Carl Berner",
    "Colosseum",
    "Fagerborgr",
    "Fornebu",
    "Hasle",
    "Hellerud",
    "Hoff",
    "Ila",
    "Jessheim",
    "Kalbakken",
    "Kampen",
    "Karlsrud",
    "Kolbotn",
    "Lambertseter",
    "Lillestrøm",
    "Linderud",
    "Metro",
    "Njård",
    "Nydalen",
    "Ringnes Park",
    "Ryen",
    "Røa",
    "Sagene",
    "Sandvika Panorama",
    "Schous plass",
    "Sjølyst",
    "Skedsmokorset",
    "Slemmestad",
    "Solli",
    "Storo",
    "Triaden",
    "Ullevaal",
    "Vinderen",
    "Yoga Aker Brygge",
    "Yoga Majorstuen",
];

/// Fixed set of known facility names
///
/// Lookups are exact and case-insensitive; a hit returns the canonical spelling.
#[derive(Debug, Clone)]
pub struct LocationGazetteer {
    names: Vec<String>,
}

impl LocationGazetteer {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical name of `candidate`, if it is a known location
    pub fn lookup(&self, candidate: &str) -> Option<&str> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        self.names
            .iter()
            .find(|name| name.to_lowercase() == candidate)
            .map(String::as_str)
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.lookup(candidate).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LocationGazetteer {
    fn default() -> Self {
        Self::new(SATS_LOCATIONS.iter().copied())
    }
}
