//! Chromium backend over the Chrome DevTools Protocol.
//!
//! Element lookups run as injected JavaScript. A resolved element is
//! tagged with a `data-textwright-ref` attribute whose value becomes the
//! [`TargetRef`]; every later call finds the element again by that tag.
//! Pointer input goes through `Input.dispatchMouseEvent` so sliders see
//! real drags.

use super::{BoundingBox, Point, TargetRef, UiBackend};
use crate::result::{TextwrightError, TextwrightResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct CdpConfig {
    /// Run without a window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl CdpConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Page helpers, evaluated to one object per document
const HELPERS: &str = r#"(() => {
  if (window.__textwright) return window.__textwright;
  const ATTR = 'data-textwright-ref';
  let counter = 0;
  const heading = () => 'heading';
  const IMPLICIT = {
    a: el => el.hasAttribute('href') ? 'link' : 'generic',
    area: el => el.hasAttribute('href') ? 'link' : 'generic',
    article: () => 'article', aside: () => 'complementary', button: () => 'button',
    dialog: () => 'dialog', footer: () => 'contentinfo', form: () => 'form',
    h1: heading, h2: heading, h3: heading, h4: heading, h5: heading, h6: heading,
    header: () => 'banner', hr: () => 'separator',
    img: el => el.getAttribute('alt') === '' ? 'presentation' : 'img',
    input: el => {
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      const list = el.hasAttribute('list');
      return ({
        button: 'button', submit: 'button', reset: 'button', image: 'button',
        checkbox: 'checkbox', radio: 'radio', range: 'slider', number: 'spinbutton',
        search: list ? 'combobox' : 'searchbox',
      })[type] || (list ? 'combobox' : 'textbox');
    },
    li: () => 'listitem', main: () => 'main', nav: () => 'navigation',
    ol: () => 'list', ul: () => 'list', option: () => 'option',
    progress: () => 'progressbar', section: () => 'region',
    select: el => (el.multiple || el.size > 1) ? 'listbox' : 'combobox',
    table: () => 'table', tbody: () => 'rowgroup', thead: () => 'rowgroup',
    td: () => 'cell', th: () => 'columnheader', tr: () => 'row', textarea: () => 'textbox',
  };
  const role = el => {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit.trim().split(/\s+/)[0];
    const implicit = IMPLICIT[el.localName];
    return implicit ? implicit(el) : 'generic';
  };
  const text = el => (el.innerText ?? el.textContent ?? '').trim();
  const byIds = ids => ids.split(/\s+/)
    .map(id => document.getElementById(id)).filter(Boolean).map(text).join(' ');
  const labels = el => {
    const out = [];
    const aria = el.getAttribute('aria-label');
    if (aria) out.push(aria);
    const by = el.getAttribute('aria-labelledby');
    if (by) out.push(byIds(by));
    if (el.labels) for (const label of el.labels) out.push(text(label));
    return out;
  };
  const name = el => {
    const found = labels(el);
    if (found.length) return found.join(' ');
    for (const attr of ['alt', 'title', 'placeholder']) {
      const value = el.getAttribute(attr);
      if (value) return value;
    }
    if (el.localName === 'input' && ['button', 'submit', 'reset'].includes(el.type)) return el.value;
    return text(el);
  };
  const shown = el => {
    if (!el.isConnected) return false;
    const style = getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  const has = (hay, needle) => hay.toLowerCase().includes(needle.toLowerCase());
  const ref = el => {
    if (!el) return null;
    let id = el.getAttribute(ATTR);
    if (!id) {
      id = 't' + (++counter);
      el.setAttribute(ATTR, id);
    }
    return id;
  };
  const get = id => {
    const el = document.querySelector(`[${ATTR}="${id}"]`);
    if (!el) throw new Error(`stale element handle ${id}`);
    return el;
  };
  const root = id => id ? get(id) : document;
  const all = id => Array.from(root(id).querySelectorAll('*'));
  window.__textwright = {
    byRole: (r, n, scope) => ref(all(scope).find(el => role(el) === r && has(name(el), n))),
    byAttribute: (attr, value) => ref(all(null).find(el => el.getAttribute(attr) === value)),
    byLabel: (n, scope) => ref(all(scope).find(el => labels(el).some(l => has(l, n)))),
    byCss: (css, scope) => ref(root(scope).querySelector(css)),
    section: h => ref(Array.from(document.querySelectorAll('section')).find(sec =>
      Array.from(sec.querySelectorAll('h1,h2,h3,h4,h5,h6,[role=heading]')).some(x => has(text(x), h)))),
    visible: id => shown(get(id)),
    value: id => { const el = get(id); return el.value ?? el.getAttribute('value') ?? ''; },
    text: id => text(get(id)),
    attribute: (id, attr) => get(id).getAttribute(attr),
    box: id => {
      const el = get(id);
      el.scrollIntoView({ block: 'center', inline: 'center' });
      const r = el.getBoundingClientRect();
      return r.width > 0 && r.height > 0 ? { x: r.x, y: r.y, width: r.width, height: r.height } : null;
    },
    fill: (id, value) => {
      const el = get(id);
      el.focus();
      if (el.isContentEditable) {
        el.textContent = value;
      } else {
        const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value')?.set;
        if (setter) setter.call(el, value); else el.value = value;
      }
      el.dispatchEvent(new Event('input', { bubbles: true }));
      el.dispatchEvent(new Event('change', { bubbles: true }));
      return true;
    },
  };
  return window.__textwright;
})()"#;

/// [`UiBackend`] driving a Chromium page
#[derive(Debug)]
pub struct CdpBackend {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handle: tokio::task::JoinHandle<()>,
    initial_url: String,
    pointer: Point,
    pressed: bool,
}

impl CdpBackend {
    /// Launch Chromium and open `url`
    pub async fn launch(config: CdpConfig, url: &str) -> TextwrightResult<Self> {
        let mut builder = CdpBrowserConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(TextwrightError::backend)?;
        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(TextwrightError::backend)?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(TextwrightError::backend)?;
        info!(%url, headless = config.headless, "browser launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handle,
            initial_url: url.to_string(),
            pointer: Point::new(0.0, 0.0),
            pressed: false,
        })
    }

    /// Close the browser
    pub async fn close(self) -> TextwrightResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(TextwrightError::backend)?;
        self.handle.abort();
        Ok(())
    }

    /// Call a page helper; arguments and result travel as JSON
    async fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> TextwrightResult<T> {
        let expression = format!("JSON.stringify({HELPERS}.{method}(...{args}))");
        let raw: String = self
            .page
            .evaluate(expression)
            .await
            .map_err(TextwrightError::backend)?
            .into_value()?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn eval_string(&self, expression: &str) -> TextwrightResult<String> {
        Ok(self
            .page
            .evaluate(expression)
            .await
            .map_err(TextwrightError::backend)?
            .into_value()?)
    }

    async fn mouse(&self, kind: DispatchMouseEventType, point: Point, buttons: i64) -> TextwrightResult<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind.clone())
            .x(point.x)
            .y(point.y)
            .buttons(buttons);
        if matches!(
            kind,
            DispatchMouseEventType::MousePressed | DispatchMouseEventType::MouseReleased
        ) || buttons != 0
        {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(TextwrightError::backend)?;
        self.page
            .execute(params)
            .await
            .map_err(TextwrightError::backend)?;
        Ok(())
    }

    async fn center(&self, target: &TargetRef) -> TextwrightResult<Point> {
        self.bounding_box(target)
            .await?
            .map(|b| b.center())
            .ok_or_else(|| TextwrightError::backend(format!("element {target} is not rendered")))
    }

    fn held(&self) -> i64 {
        i64::from(self.pressed)
    }
}

#[async_trait]
impl UiBackend for CdpBackend {
    async fn resolve_by_role(
        &self,
        role: &str,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        let id: Option<String> = self
            .call("byRole", json!([role, name, scope.map(|s| &s.id)]))
            .await?;
        Ok(id.map(TargetRef::new))
    }

    async fn resolve_by_attribute(
        &self,
        attribute: &str,
        value: &str,
    ) -> TextwrightResult<Option<TargetRef>> {
        let id: Option<String> = self.call("byAttribute", json!([attribute, value])).await?;
        Ok(id.map(TargetRef::new))
    }

    async fn resolve_by_label(
        &self,
        name: &str,
        scope: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        let id: Option<String> = self
            .call("byLabel", json!([name, scope.map(|s| &s.id)]))
            .await?;
        Ok(id.map(TargetRef::new))
    }

    async fn resolve_by_css(
        &self,
        css: &str,
        within: Option<&TargetRef>,
    ) -> TextwrightResult<Option<TargetRef>> {
        let id: Option<String> = self
            .call("byCss", json!([css, within.map(|s| &s.id)]))
            .await?;
        Ok(id.map(TargetRef::new))
    }

    async fn resolve_section(&self, heading: &str) -> TextwrightResult<Option<TargetRef>> {
        let id: Option<String> = self.call("section", json!([heading])).await?;
        Ok(id.map(TargetRef::new))
    }

    async fn is_visible(&self, target: &TargetRef) -> TextwrightResult<bool> {
        self.call("visible", json!([target.id])).await
    }

    async fn click(&mut self, target: &TargetRef) -> TextwrightResult<()> {
        let point = self.center(target).await?;
        debug!(%target, x = point.x, y = point.y, "click");
        self.mouse(DispatchMouseEventType::MouseMoved, point, 0).await?;
        self.mouse(DispatchMouseEventType::MousePressed, point, 1).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, point, 0).await?;
        self.pointer = point;
        Ok(())
    }

    async fn hover(&mut self, target: &TargetRef) -> TextwrightResult<()> {
        let point = self.center(target).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, point, 0).await?;
        self.pointer = point;
        Ok(())
    }

    async fn fill(&mut self, target: &TargetRef, text: &str) -> TextwrightResult<()> {
        let _: bool = self.call("fill", json!([target.id, text])).await?;
        Ok(())
    }

    async fn value(&self, target: &TargetRef) -> TextwrightResult<String> {
        self.call("value", json!([target.id])).await
    }

    async fn text(&self, target: &TargetRef) -> TextwrightResult<String> {
        self.call("text", json!([target.id])).await
    }

    async fn attribute(&self, target: &TargetRef, name: &str) -> TextwrightResult<Option<String>> {
        self.call("attribute", json!([target.id, name])).await
    }

    async fn bounding_box(&self, target: &TargetRef) -> TextwrightResult<Option<BoundingBox>> {
        self.call("box", json!([target.id])).await
    }

    async fn pointer_move(&mut self, point: Point) -> TextwrightResult<()> {
        self.mouse(DispatchMouseEventType::MouseMoved, point, self.held())
            .await?;
        self.pointer = point;
        Ok(())
    }

    async fn pointer_down(&mut self) -> TextwrightResult<()> {
        self.mouse(DispatchMouseEventType::MousePressed, self.pointer, 1)
            .await?;
        self.pressed = true;
        Ok(())
    }

    async fn pointer_up(&mut self) -> TextwrightResult<()> {
        self.pressed = false;
        self.mouse(DispatchMouseEventType::MouseReleased, self.pointer, 0)
            .await
    }

    async fn current_url(&self) -> TextwrightResult<String> {
        self.eval_string("location.href").await
    }

    async fn title(&self) -> TextwrightResult<String> {
        self.eval_string("document.title").await
    }

    async fn reload(&mut self) -> TextwrightResult<()> {
        debug!(url = %self.initial_url, "restoring initial page");
        self.page
            .goto(self.initial_url.as_str())
            .await
            .map_err(TextwrightError::backend)?;
        self.pressed = false;
        Ok(())
    }
}
