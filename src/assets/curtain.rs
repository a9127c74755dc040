use crate::foundation::error::{LayerplayError, LayerplayResult};

/// Character grid whose cells are revealed in "encounter" order.
///
/// File format: a `w h` header line, `h` lines of characters (padded with spaces to `w`), then
/// one line per row of comma separated encounter indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextCurtain {
    characters: Vec<Vec<char>>,
    encounters: Vec<Vec<i64>>,
    frame_count: i64,
}

impl TextCurtain {
    pub fn parse(text: &str) -> LayerplayResult<Self> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| LayerplayError::validation("text curtain is empty"))?;
        let dims: Vec<usize> = header
            .split_whitespace()
            .map(|t| t.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| LayerplayError::validation(format!("bad curtain header '{header}': {e}")))?;
        let [width, height] = dims[..] else {
            return Err(LayerplayError::validation(format!(
                "curtain header must be 'width height', got '{header}'"
            )));
        };

        let mut characters = Vec::with_capacity(height);
        for row in 0..height {
            let line = lines.next().ok_or_else(|| {
                LayerplayError::validation(format!("curtain has {row} of {height} text rows"))
            })?;
            let mut chars: Vec<char> = line.chars().take(width).collect();
            chars.resize(width, ' ');
            characters.push(chars);
        }

        let mut encounters = Vec::with_capacity(height);
        for (row, line) in lines.filter(|l| !l.trim().is_empty()).enumerate() {
            let values = line
                .split(',')
                .map(|t| t.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    LayerplayError::validation(format!("bad encounter row {row}: {e}"))
                })?;
            encounters.push(values);
        }
        if encounters.len() < height {
            return Err(LayerplayError::validation(format!(
                "curtain has {} encounter rows for {height} text rows",
                encounters.len()
            )));
        }

        let frame_count = encounters
            .iter()
            .flat_map(|r| r.iter().copied())
            .max()
            .unwrap_or(0);

        Ok(Self {
            characters,
            encounters,
            frame_count,
        })
    }

    pub fn frame_count(&self) -> i64 {
        self.frame_count
    }

    pub fn rows(&self) -> usize {
        self.characters.len()
    }

    /// Text rows with every cell outside the `[start, end)` reveal range blanked.
    ///
    /// `start` and `end` are fractions of the frame count.
    pub fn reveal(&self, start: f64, end: f64) -> Vec<String> {
        let fc = self.frame_count as f64;
        let lo = (start * fc) as i64;
        let hi = (end * fc) as i64;
        self.characters
            .iter()
            .zip(&self.encounters)
            .map(|(chars, enc)| {
                chars
                    .iter()
                    .enumerate()
                    .map(|(x, &c)| match enc.get(x) {
                        Some(&e) if e >= lo && e < hi => c,
                        _ => ' ',
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/curtain.rs"]
mod tests;
