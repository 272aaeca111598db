use crate::error::Result;
use crate::surface::TargetSurface;

/// Id of the head style element holding the font import. The host page ignores
/// `@import` inside an inserted stylesheet, so it cannot ride in the patch.
pub const FONT_STYLE_ID: &str = "fourtw-style-extension-font";

pub fn import_rule(url: &str) -> String {
    format!("@import url('{}');", url)
}

/// Replaces the font import element with one importing `url`, or removes it
/// when `url` is `None`. Repeating a call leaves a single element.
pub async fn set_font_import<T>(surface: &mut T, url: Option<&str>) -> Result<()>
where
    T: TargetSurface + ?Sized,
{
    surface.remove_head_style(FONT_STYLE_ID).await?;
    if let Some(url) = url.filter(|url| !url.is_empty()) {
        tracing::debug!(url, "installing font import");
        surface.set_head_style(FONT_STYLE_ID, &import_rule(url)).await?;
    }
    Ok(())
}
