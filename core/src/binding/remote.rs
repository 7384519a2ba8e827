//! Remote cursor and selection rendering

use super::surface::{MarkerId, Surface};
use crate::error::{OtError, Result};
use crate::ot::Selection;

/// Visual artifacts drawn for one remote client's selection.
///
/// Must be disposed before a newer selection of the same client is
/// rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a rendering left undisposed stays on the surface"]
pub struct RemoteRendering {
    client_id: String,
    markers: Vec<MarkerId>,
}

impl RemoteRendering {
    /// Draw `selection`: a cursor marker per empty range, a highlight per
    /// non-empty one.
    pub fn render<S: Surface + ?Sized>(
        surface: &mut S,
        client_id: &str,
        selection: &Selection,
        color: &str,
    ) -> Result<Self> {
        validate_color(color)?;
        let markers = selection
            .ranges
            .iter()
            .map(|range| {
                if range.is_empty() {
                    surface.add_cursor_marker(range.head, color, client_id)
                } else {
                    surface.add_selection_marker(range.from(), range.to(), color, client_id)
                }
            })
            .collect();
        Ok(Self {
            client_id: client_id.to_string(),
            markers,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Remove every marker this rendering drew
    pub fn dispose<S: Surface + ?Sized>(self, surface: &mut S) {
        for marker in self.markers {
            surface.clear_marker(marker);
        }
    }
}

/// Accept only `#rrggbb`
pub fn validate_color(color: &str) -> Result<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(OtError::InvalidColor(color.to_string()))
    }
}
