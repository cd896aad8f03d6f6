use crate::generation::assembler::ResumeDocument;

/// Plain-text export: the document's flat markdown-style form.
pub fn render_text(document: &ResumeDocument) -> String {
    document.to_plain_text()
}
