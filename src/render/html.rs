//! Self-contained HTML page around the rendered trace

use std::fmt::Write;

use super::{Canvas, TraceGeometry};

/// Build the full page for a computed trace
pub fn render_page(geometry: &TraceGeometry, canvas: &Canvas) -> String {
    let stats = &geometry.stats;
    let w = canvas.width;
    let h = canvas.height;

    let mut page = String::with_capacity(2048 + geometry.points.len() * 12);
    // Writing into a String cannot fail
    let _ = write!(
        page,
        r##"<!doctype html>
<html>
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Seismometer</title>
<style>
  body{{font-family:ui-monospace,monospace;background:#0b0e11;color:#e5e7eb;margin:20px}}
  .wrap{{max-width:{w}px;margin:auto}}
  .row{{display:flex;gap:12px;flex-wrap:wrap;align-items:center}}
  .tag{{background:#111827;border:1px solid #374151;border-radius:6px;padding:6px 10px}}
  svg{{width:100%;height:auto;background:#0f172a;border:1px solid #334155;border-radius:8px}}
</style>
</head>
<body>
  <div class="wrap">
    <h1>Seismometer</h1>
    <div class="row">
      <div class="tag">Window: {window} min</div>
      <div class="tag">Samples: {count}</div>
      <div class="tag">Latest a: {latest_a} m/s²</div>
      <div class="tag">Latest xyz: {latest_xyz}</div>
      <div class="tag">Baseline g≈9.81 removed</div>
    </div>
    <svg viewBox="0 0 {w} {h}" role="img" aria-label="Seismometer trace">
      <rect x="0" y="{mid}" width="{w}" height="1" fill="#1f2937"/>
      <polyline fill="none" stroke="#93c5fd" stroke-width="2" points="{points}"/>
    </svg>
  </div>
</body>
</html>"##,
        w = w,
        h = h,
        mid = h / 2.0,
        window = stats.window_minutes,
        count = stats.count,
        latest_a = stats.latest_a,
        latest_xyz = stats.latest_xyz,
        points = geometry.polyline(),
    );
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_trace;
    use crate::sensors::Reading;

    #[test]
    fn test_empty_page() {
        let canvas = Canvas::default();
        let page = render_page(&render_trace(&[], 3_600_000, 0, &canvas), &canvas);

        assert!(page.starts_with("<!doctype html>"));
        assert!(page.contains("Window: 60 min"));
        assert!(page.contains("Samples: 0"));
        assert!(page.contains("Latest a: – m/s²"));
        assert!(page.contains(r#"viewBox="0 0 900 220""#));
        assert!(page.contains(r#"points="""#));
    }

    #[test]
    fn test_page_embeds_trace() {
        let canvas = Canvas::default();
        let samples = [
            Reading::from_axes(1000, 0.0, 0.0, 9.81),
            Reading::from_axes(1200, 0.0, 0.0, 0.0),
        ];
        let page = render_page(&render_trace(&samples, 1000, 1200, &canvas), &canvas);

        assert!(page.contains(r#"points="714.0,210.0 890.0,10.0""#));
        assert!(page.contains("Latest xyz: 0.000, 0.000, 0.000"));
        assert!(page.contains(r#"y="110""#));
    }
}
