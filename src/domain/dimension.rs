use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// The seven psychosocial dimensions of the questionnaire, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Demandas,
    Controle,
    Relacionamento,
    Cargo,
    Mudanca,
    ApoioChefia,
    ApoioColegas,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dimension `{0}`")]
pub struct UnknownDimension(pub String);

impl Dimension {
    pub const COUNT: usize = 7;

    pub const ALL: [Dimension; Dimension::COUNT] = [
        Dimension::Demandas,
        Dimension::Controle,
        Dimension::Relacionamento,
        Dimension::Cargo,
        Dimension::Mudanca,
        Dimension::ApoioChefia,
        Dimension::ApoioColegas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Demandas => "demandas",
            Dimension::Controle => "controle",
            Dimension::Relacionamento => "relacionamento",
            Dimension::Cargo => "cargo",
            Dimension::Mudanca => "mudanca",
            Dimension::ApoioChefia => "apoio_chefia",
            Dimension::ApoioColegas => "apoio_colegas",
        }
    }

    /// Number of Likert items the questionnaire asks for this dimension.
    pub fn item_count(&self) -> usize {
        match self {
            Dimension::Demandas => 8,
            Dimension::Controle => 7,
            Dimension::Relacionamento => 4,
            Dimension::Cargo => 4,
            Dimension::Mudanca => 3,
            Dimension::ApoioChefia => 5,
            Dimension::ApoioColegas => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Demandas => "Demandas",
            Dimension::Controle => "Controle",
            Dimension::Relacionamento => "Relacionamento",
            Dimension::Cargo => "Cargo",
            Dimension::Mudanca => "Mudança",
            Dimension::ApoioChefia => "Apoio Chefia",
            Dimension::ApoioColegas => "Apoio Colegas",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Suffix used by environment keys, e.g. `APOIO_CHEFIA`.
    pub fn env_suffix(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_lowercase();
        Dimension::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| UnknownDimension(raw.to_string()))
    }
}

/// One value per dimension, always iterated and serialised in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerDimension<T>([T; Dimension::COUNT]);

impl<T> PerDimension<T> {
    pub fn from_fn(f: impl FnMut(Dimension) -> T) -> Self {
        Self(Dimension::ALL.map(f))
    }

    pub fn get(&self, dimension: Dimension) -> &T {
        &self.0[dimension.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &T)> {
        Dimension::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Dimension, &T) -> U) -> PerDimension<U> {
        PerDimension::from_fn(|d| f(d, &self.0[d.index()]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<T: Default> Default for PerDimension<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Dimension> for PerDimension<T> {
    type Output = T;

    fn index(&self, dimension: Dimension) -> &T {
        &self.0[dimension.index()]
    }
}

impl<T> IndexMut<Dimension> for PerDimension<T> {
    fn index_mut(&mut self, dimension: Dimension) -> &mut T {
        &mut self.0[dimension.index()]
    }
}

impl<T: Serialize> Serialize for PerDimension<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Dimension::COUNT))?;
        for (dimension, value) in self.iter() {
            map.serialize_entry(dimension.as_str(), value)?;
        }
        map.end()
    }
}
