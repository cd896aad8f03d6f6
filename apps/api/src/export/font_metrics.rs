//! Static font-metric tables for the two standard PDF fonts used by the PDF exporter.
//!
//! Character widths are in em units (AFM widths / 1000). Standard-14 fonts are
//! not embedded, so the viewer supplies the glyphs and these tables only drive
//! line wrapping. Tables cover ASCII 0x20..=0x7E; index = (char as usize) - 32.

/// The fonts referenced by generated PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PdfFont {
    Helvetica,
    HelveticaBold,
}

impl PdfFont {
    /// PostScript name written into the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match self {
            PdfFont::Helvetica => "Helvetica",
            PdfFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name used in content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            PdfFont::Helvetica => "F1",
            PdfFont::HelveticaBold => "F2",
        }
    }

    pub fn metrics(&self) -> &'static FontMetricTable {
        match self {
            PdfFont::Helvetica => &HELVETICA_TABLE,
            PdfFont::HelveticaBold => &HELVETICA_BOLD_TABLE,
        }
    }
}

/// US letter with 1" margins, in points.
#[derive(Debug, Clone, Copy)]
pub struct PageConfig {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_pt: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_pt: 612.0,
            height_pt: 792.0,
            margin_pt: 72.0,
        }
    }
}

impl PageConfig {
    pub fn text_width_pt(&self) -> f32 {
        self.width_pt - 2.0 * self.margin_pt
    }
}

pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Width of `s` in em units. Non-ASCII characters use `average_char_width`.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Greedy word wrap of one paragraph at `max_width_pt` for `font_size_pt`.
    ///
    /// A word wider than the line is placed on its own line. Whitespace-only
    /// input yields no lines.
    pub fn wrap_lines(&self, text: &str, font_size_pt: f32, max_width_pt: f32) -> Vec<String> {
        let max_width = max_width_pt / font_size_pt;
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_w = self.measure_str(word);

            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + self.space_width + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += self.space_width + word_w;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_known_string() {
        // H(0.722) + i(0.222)
        let w = PdfFont::Helvetica.metrics().measure_str("Hi");
        assert!((w - 0.944).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Professional Summary";
        assert!(
            PdfFont::HelveticaBold.metrics().measure_str(text)
                > PdfFont::Helvetica.metrics().measure_str(text)
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let metrics = PdfFont::Helvetica.metrics();
        let text = "Experience with Docker containerization and Kubernetes orchestration. ".repeat(10);
        let lines = metrics.wrap_lines(&text, 11.0, 468.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.measure_str(line) * 11.0 <= 468.0, "overfull line: {line}");
        }
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_wrap_short_text_is_single_line() {
        let lines = PdfFont::Helvetica.metrics().wrap_lines("Rust engineer", 11.0, 468.0);
        assert_eq!(lines, vec!["Rust engineer"]);
    }

    #[test]
    fn test_wrap_blank_text_is_empty() {
        assert!(PdfFont::Helvetica.metrics().wrap_lines("  \n ", 11.0, 468.0).is_empty());
    }

    #[test]
    fn test_overlong_word_gets_own_line() {
        let long = "x".repeat(200);
        let lines = PdfFont::Helvetica
            .metrics()
            .wrap_lines(&format!("a {long} b"), 11.0, 100.0);
        assert_eq!(lines, vec!["a".to_string(), long, "b".to_string()]);
    }

    #[test]
    fn test_default_page_text_width() {
        assert_eq!(PageConfig::default().text_width_pt(), 468.0);
    }
}
