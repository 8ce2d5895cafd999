//! Round-robin rotation over a rule's response list.

use parking_lot::Mutex;

use crate::rules::types::SimResponse;

/// Cycles through a rule's responses in declaration order, wrapping around.
///
/// The cursor always points at the next response to serve. A rule that ends
/// up with no responses gets a single synthetic `200` so resolution never
/// has nothing to return.
#[derive(Debug)]
pub struct ResponseRotator {
    responses: Vec<SimResponse>,
    cursor: Mutex<usize>,
}

impl ResponseRotator {
    pub fn new(responses: Vec<SimResponse>) -> Self {
        let responses = if responses.is_empty() {
            vec![SimResponse::default()]
        } else {
            responses
        };
        Self {
            responses,
            cursor: Mutex::new(0),
        }
    }

    /// Return the current response and advance the cursor.
    pub fn next(&self) -> SimResponse {
        let mut cursor = self.cursor.lock();
        let response = self.responses[*cursor].clone();
        *cursor = (*cursor + 1) % self.responses.len();
        response
    }

    /// Rewind to the first response.
    pub fn reset(&self) {
        *self.cursor.lock() = 0;
    }

    pub fn responses(&self) -> &[SimResponse] {
        &self.responses
    }
}
