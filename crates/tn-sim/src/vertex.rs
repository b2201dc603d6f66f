//! Named stops.

use tn_core::PassengerId;

/// A place in the city.  Walking and driving graphs share the same vertex
/// set; `passengers` lists everyone standing here, in arrival order.
#[derive(Debug, Clone)]
pub struct Vertex {
    name:       String,
    passengers: Vec<PassengerId>,
}

impl Vertex {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), passengers: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passengers(&self) -> &[PassengerId] {
        &self.passengers
    }

    pub(crate) fn add_passenger(&mut self, passenger: PassengerId) {
        self.passengers.push(passenger);
    }

    pub(crate) fn remove_passenger(&mut self, passenger: PassengerId) {
        if let Some(i) = self.passengers.iter().position(|&p| p == passenger) {
            self.passengers.remove(i);
        }
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
