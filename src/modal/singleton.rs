//! "Ensure it exists, create it if missing" for the three modal singletons

use crate::config::SelectorConfig;
use crate::dom::markup::{ParsedElement, parse_fragment};
use crate::dom::{Document, DocumentError, DocumentExt, ElementId};

/// Return the element with `id`, inserting `skeleton` under the body first
/// when it is missing
pub fn ensure_singleton<D: Document + ?Sized>(
    doc: &mut D,
    id: &str,
    skeleton: &str,
) -> Result<ElementId, DocumentError> {
    if let Some(existing) = doc.element_by_id(id) {
        return Ok(existing);
    }
    let root = doc.root();
    doc.insert_markup(root, skeleton)?;
    doc.element_by_id(id)
        .ok_or_else(|| DocumentError::Markup(format!("skeleton does not define #{}", id)))
}

/// Whether a fragment carries its own modal root with `id`
pub fn fragment_has_root(html: &str, id: &str) -> bool {
    fn walk(el: &ParsedElement, id: &str) -> bool {
        el.attribute("id") == Some(id) || el.children.iter().any(|c| walk(c, id))
    }
    parse_fragment(html)
        .map(|elements| elements.iter().any(|el| walk(el, id)))
        .unwrap_or(false)
}

pub fn entity_modal_skeleton(selectors: &SelectorConfig) -> String {
    format!(
        r#"<div class="modal fade" id="{modal}" tabindex="-1" role="dialog" aria-hidden="true" style="display:none">
  <div class="modal-dialog modal-lg" role="document">
    <div class="modal-content">
      <div class="modal-header">
        <h5 class="modal-title"></h5>
        <button type="button" class="btn-close" data-bs-dismiss="modal" aria-label="Close"></button>
      </div>
      <div class="modal-body"></div>
      <div class="modal-footer">
        <button type="button" class="btn btn-secondary" data-bs-dismiss="modal">Cancel</button>
        <button type="button" class="btn btn-primary" id="{save}">Save</button>
      </div>
    </div>
  </div>
</div>"#,
        modal = selectors.entity_modal_id,
        save = selectors.save_button_id,
    )
}

pub fn login_modal_skeleton(selectors: &SelectorConfig, action: &str) -> String {
    format!(
        r#"<div class="modal fade" id="{modal}" tabindex="-1" role="dialog" aria-hidden="true" style="display:none">
  <div class="modal-dialog" role="document">
    <div class="modal-content">
      <div class="modal-body">
        <div class="login-error alert alert-danger" style="display:none"></div>
        <form id="{form}" method="post" action="{action}">
          <input type="text" name="username" class="form-control" autocomplete="username" required>
          <input type="password" name="password" class="form-control" required>
          <div class="otp-group" style="display:none">
            <input type="text" name="{otp}" class="form-control" inputmode="numeric" autocomplete="one-time-code">
          </div>
          <button type="submit" class="btn btn-primary">Log in</button>
        </form>
      </div>
    </div>
  </div>
</div>"#,
        modal = selectors.login_modal_id,
        form = selectors.login_form_id,
        otp = selectors.otp_field_name,
        action = action,
    )
}

pub fn image_modal_skeleton(selectors: &SelectorConfig) -> String {
    format!(
        r#"<div class="modal fade" id="{modal}" tabindex="-1" aria-hidden="true" style="display:none">
  <div class="modal-dialog modal-dialog-centered">
    <div class="modal-content">
      <button type="button" class="btn-close" data-bs-dismiss="modal" aria-label="Close"></button>
      <img class="preview-image img-fluid" alt="Preview">
    </div>
  </div>
</div>"#,
        modal = selectors.image_modal_id,
    )
}

/// Show a modal root: displayed, `show` class, not hidden from assistive tech
pub fn show_modal<D: Document + ?Sized>(doc: &mut D, modal: ElementId) -> Result<(), DocumentError> {
    doc.set_displayed(modal, true)?;
    doc.add_class(modal, "show")?;
    doc.stamp_attribute(modal, "aria-hidden", "false")?;
    Ok(())
}

pub fn hide_modal<D: Document + ?Sized>(doc: &mut D, modal: ElementId) -> Result<(), DocumentError> {
    doc.set_displayed(modal, false)?;
    doc.remove_class(modal, "show")?;
    doc.stamp_attribute(modal, "aria-hidden", "true")?;
    Ok(())
}
