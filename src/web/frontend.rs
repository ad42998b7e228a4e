//! Embedded HTML/CSS/JS frontend for the loadplan web dashboard.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies. It renders the
//! derived view served by `/api/run` and `/api/session`; all arithmetic
//! happens server-side.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>loadplan Dashboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header .backend { color: var(--text-muted); font-family: var(--mono); font-size: 12px; }

.controls {
  display: flex;
  flex-wrap: wrap;
  gap: 12px;
  align-items: flex-end;
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  margin-bottom: 16px;
}
.controls label { display: flex; flex-direction: column; gap: 4px; color: var(--text-muted); font-size: 12px; }
select, input, button {
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 10px;
  font-size: 14px;
}
button { cursor: pointer; background: var(--accent); color: #0d1117; border: none; font-weight: 600; }
button.secondary { background: var(--surface); color: var(--text); border: 1px solid var(--border); }
button:disabled { opacity: 0.5; cursor: not-allowed; }

.banner { border-radius: var(--radius); padding: 12px 16px; margin-bottom: 16px; }
.banner.error { background: rgba(248, 81, 73, 0.15); border: 1px solid var(--red); }
.banner.warning { background: rgba(210, 153, 34, 0.15); border: 1px solid var(--yellow); }
.banner.info { background: rgba(88, 166, 255, 0.1); border: 1px solid var(--accent); }
.hidden { display: none; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; margin-bottom: 12px; }
.card h3 { font-size: 13px; color: var(--text-muted); margin: 12px 0 6px; }

.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 10px; }
.metric { border: 1px solid var(--border); border-radius: 6px; padding: 8px 10px; }
.metric .label { color: var(--text-muted); font-size: 12px; }
.metric .value { font-size: 18px; font-weight: 600; font-family: var(--mono); }
.tone-good { color: var(--green); }
.tone-warning { color: var(--yellow); }
.tone-bad { color: var(--red); }

.bar-row { display: grid; grid-template-columns: 140px 1fr 140px; gap: 8px; align-items: center; margin: 3px 0; }
.bar-row .name { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.bar-track { background: var(--bg); border-radius: 4px; height: 14px; }
.bar-fill { background: var(--accent); border-radius: 4px; height: 14px; }
.bar-row .amount { font-family: var(--mono); font-size: 12px; color: var(--text-muted); text-align: right; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; }
td.num { font-family: var(--mono); text-align: right; }

.two-col { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
@media (max-width: 800px) { .two-col { grid-template-columns: 1fr; } }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>loadplan</h1>
    <span class="backend" id="backend"></span>
  </header>

  <div class="controls">
    <label>Flight <select id="flight"></select></label>
    <label>Model
      <select id="model">
        <option value="delgado_venezian">DelgadoVenezian</option>
        <option value="baseline">Baseline</option>
        <option value="optimized_actual">Optimized Actual</option>
        <option value="bax_fixed">BAX Fixed</option>
      </select>
    </label>
    <label>Restricted locations <input id="restricted" placeholder="e.g. 11P, 12L"></label>
    <button id="run">Run optimization</button>
    <button id="cancel" class="secondary hidden">Cancel</button>
    <button id="reload" class="secondary">Reload flights</button>
    <button id="export" class="secondary" disabled>Export to spreadsheet</button>
  </div>

  <div id="error" class="banner error hidden"></div>
  <div id="notice" class="banner info hidden"></div>
  <div id="result"></div>
</div>

<script>
const $ = (id) => document.getElementById(id);

function esc(s) {
  return String(s ?? '').replace(/[&<>"']/g, (c) => ({
    '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
  })[c]);
}

function show(el, text) { el.textContent = text; el.classList.remove('hidden'); }
function hide(el) { el.textContent = ''; el.classList.add('hidden'); }

function fmtKg(v) { return v == null ? 'N/A' : v.toFixed(1) + ' kg'; }
function fmtSignedKg(v) { return v == null ? 'N/A' : (v >= 0 ? '+' : '') + v.toFixed(1) + ' kg'; }
function fmtPct(v) { return v == null ? 'N/A' : v.toFixed(1) + '%'; }

// ---------------------------------------------------------------- building blocks

function metrics(list) {
  if (!list || list.length === 0) return '';
  return '<div class="grid">' + list.map((m) =>
    `<div class="metric"><div class="label">${esc(m.label)}</div>` +
    `<div class="value tone-${esc(m.tone)}">${esc(m.value)}</div></div>`
  ).join('') + '</div>';
}

function bars(title, rows, amount) {
  if (!rows || rows.length === 0) return '';
  const max = Math.max(...rows.map((r) => r.value), 0);
  return `<h3>${esc(title)}</h3>` + rows.map((r) => {
    const width = max > 0 ? (r.value / max) * 100 : 0;
    return `<div class="bar-row"><span class="name" title="${esc(r.title || r.label)}">${esc(r.label)}</span>` +
      `<div class="bar-track"><div class="bar-fill" style="width:${width}%"></div></div>` +
      `<span class="amount">${esc(amount(r))}</span></div>`;
  }).join('');
}

function shares(title, list, unit) {
  return bars(title, list, (r) =>
    (unit === 'kg' ? fmtKg(r.value) : r.value) + ' (' + fmtPct(r.percent) + ')');
}

function card(title, body) {
  return body ? `<div class="card"><h2>${esc(title)}</h2>${body}</div>` : '';
}

function comparisonTable(column, rows, fmt, fmtDiff) {
  if (!rows || rows.length === 0) return '';
  return `<table><tr><th>${esc(column)}</th><th>Actual</th><th>Optimized</th><th>Difference</th></tr>` +
    rows.map((r) => `<tr><td>${esc(r.key)}</td><td class="num">${esc(fmt(r.baseline))}</td>` +
      `<td class="num">${esc(fmt(r.optimized))}</td><td class="num">${esc(fmtDiff(r.difference))}</td></tr>`
    ).join('') + '</table>';
}

// ---------------------------------------------------------------- sections

function renderSummary(s) {
  let banner = '';
  if (s.run_mode === 'fallback') {
    banner = '<div class="banner warning">Fallback algorithm used: the solver did not produce this plan.</div>';
  } else if (s.run_mode === 'optimizer') {
    banner = '<div class="banner info">Real optimization result.</div>';
  }
  const warnings = s.warnings.length
    ? '<h3>Warnings</h3><ul>' + s.warnings.map((w) => `<li>${esc(w)}</li>`).join('') + '</ul>'
    : '';
  const aircraft = s.aircraft ? ` · ${esc(s.aircraft)}` : '';
  return `<div class="card"><h2>${esc(s.flight_number)} <span id="route">${esc(s.route)}</span></h2>` +
    `<div class="label">${esc(s.date)}${aircraft}</div>${banner}${metrics(s.metrics)}${warnings}</div>`;
}

function renderWeight(w) {
  return card('Weight Distribution', metrics(w.metrics) + '<div class="two-col"><div>' +
    shares('By compartment', w.by_compartment, 'kg') + '</div><div>' +
    shares('By side', w.by_side, 'kg') + '</div></div>');
}

function renderUld(u) {
  const items = bars('Items per ULD',
    u.items_per_uld.map((r) => ({ label: r.label, value: r.items, weight: r.weight })),
    (r) => `${r.value} items · ${fmtKg(r.weight)}`);
  const weights = bars('Weight per ULD',
    u.weight_per_uld.map((r) => ({ label: r.label, value: r.weight })),
    (r) => fmtKg(r.value));
  return card('ULD Utilization', metrics(u.metrics) + shares('By type', u.by_type, '') + items + weights);
}

function renderCargo(c) {
  if (!c) return '';
  const commodities = bars('Weight by commodity',
    c.top_commodities.map((r) => ({ label: r.label, title: r.full_label, value: r.weight })),
    (r) => Math.round(r.value).toLocaleString() + ' kg');
  let largest = '';
  if (c.largest_items.length) {
    largest = '<h3>Largest items</h3><table><tr><th>Serial</th><th>Weight</th><th>Commodity</th></tr>' +
      c.largest_items.map((i) => `<tr><td>${esc(i.serialnumber)}</td><td class="num">${esc(i.weight)}</td>` +
        `<td>${esc(i.commodity)}</td></tr>`).join('') + '</table>';
  }
  return card('Cargo', metrics(c.metrics) + shares('Items by weight range', c.weight_ranges, '') +
    commodities + largest);
}

function renderSafety(s) {
  if (!s) return '';
  let checks = '';
  let group = null;
  for (const c of s.checks) {
    if (c.group !== group) {
      if (group !== null) checks += '</table>';
      group = c.group;
      checks += `<h3>${esc(group)}</h3><table>`;
    }
    const status = c.compliant
      ? '<span class="tone-good">OK</span>'
      : '<span class="tone-bad">VIOLATION</span>';
    checks += `<tr><td>${esc(c.label)}</td><td>${status}</td></tr>`;
  }
  if (group !== null) checks += '</table>';
  return card('Safety', metrics(s.score ? [s.score] : []) + checks + metrics(s.alerts));
}

function renderComparison(c) {
  if (!c) return '';
  let body = c.baseline_available ? '' :
    '<div class="banner warning">Actual loading data not available for this flight.</div>';
  body += metrics(c.savings);
  if (c.key_metrics.length) {
    body += '<h3>Key metrics</h3><table><tr><th>Metric</th><th>Actual</th><th>Optimized</th><th>Difference</th></tr>';
    for (const r of c.key_metrics) {
      let fmt = fmtKg, fmtDiff = fmtSignedKg;
      if (r.key === 'Total ULDs') {
        fmt = (v) => v == null ? 'N/A' : v.toFixed(0);
        fmtDiff = (v) => v == null ? 'N/A' : (v > 0 ? '+' : '') + v.toFixed(0);
      } else if (r.key === 'MAC ZFW') {
        fmt = (v) => v == null ? 'N/A' : v.toFixed(2) + '%';
        fmtDiff = (v) => v == null ? 'N/A' : (v >= 0 ? '+' : '') + v.toFixed(2);
      }
      body += `<tr><td>${esc(r.key)}</td><td class="num">${esc(fmt(r.baseline))}</td>` +
        `<td class="num">${esc(fmt(r.optimized))}</td><td class="num">${esc(fmtDiff(r.difference))}</td></tr>`;
    }
    body += '</table>';
  }
  body += '<div class="two-col"><div>' +
    (c.by_compartment.length ? '<h3>By compartment</h3>' : '') +
    comparisonTable('Compartment', c.by_compartment, fmtKg, fmtSignedKg) + '</div><div>' +
    (c.by_side.length ? '<h3>By side</h3>' : '') +
    comparisonTable('Side', c.by_side, fmtKg, fmtSignedKg) + '</div></div>';
  if (c.annual) {
    const a = c.annual;
    const flights = a.flights_per_year != null ? ` (${a.flights_per_year.toLocaleString()} flights/year)` : '';
    body += `<h3>Annual impact${esc(flights)}</h3>`;
    if (a.negative) {
      body += '<div class="banner error">The optimized loading uses more fuel than the actual loading.</div>';
    }
    body += metrics(a.metrics);
    if (a.fuel_price_per_kg != null) {
      body += `<div class="label">Fuel price: $${esc(a.fuel_price_per_kg.toFixed(2))}/kg</div>`;
    }
  }
  return card('Comparison with Actual Loading', body);
}

function renderView(view) {
  const out = $('result');
  if (!view) { out.innerHTML = ''; return; }
  if (view.kind === 'failure') {
    out.innerHTML = `<div class="card"><h2 class="tone-bad">Optimization Failed</h2><p>${esc(view.message)}</p></div>`;
    return;
  }
  out.innerHTML = renderSummary(view.summary) +
    card('Performance', view.performance && metrics(view.performance.metrics)) +
    card('Solver', view.solver && metrics(view.solver.metrics)) +
    renderWeight(view.weight) + renderUld(view.uld) + renderCargo(view.cargo) +
    renderSafety(view.safety) + renderComparison(view.comparison);
}

// ---------------------------------------------------------------- session

function setBusy(busy) {
  $('run').disabled = busy;
  $('flight').disabled = busy;
  $('cancel').classList.toggle('hidden', !busy);
}

function setFlights(flights, selected) {
  const sel = $('flight');
  sel.innerHTML = flights.map((f) =>
    `<option value="${esc(f)}"${f === selected ? ' selected' : ''}>${esc(f)}</option>`).join('');
}

function applySession(s) {
  setFlights(s.flights, s.selected);
  $('model').value = s.model;
  $('restricted').value = s.restricted_locations.join(', ');
  setBusy(s.busy);
  if (s.error) show($('error'), s.error); else hide($('error'));
  renderView(s.view);
  $('export').disabled = !s.view || s.view.kind !== 'success';
}

async function api(method, path, body) {
  const opts = { method, headers: { 'Content-Type': 'application/json' } };
  if (body !== undefined) opts.body = JSON.stringify(body);
  const resp = await fetch(path, opts);
  const data = await resp.json().catch(() => ({}));
  return { ok: resp.ok, status: resp.status, data };
}

async function loadFlights() {
  const r = await api('GET', '/api/flights');
  if (r.ok) {
    hide($('error'));
    setFlights(r.data.flights, r.data.selected);
  } else {
    show($('error'), r.data.error || 'Failed to load flights');
  }
}

async function run() {
  hide($('error'));
  hide($('notice'));
  renderView(null);
  $('export').disabled = true;
  setBusy(true);
  const restricted = $('restricted').value.split(',').map((s) => s.trim()).filter(Boolean);
  const r = await api('POST', '/api/run', {
    flight: $('flight').value,
    model: $('model').value,
    restricted_locations: restricted,
  });
  setBusy(false);
  if (r.ok) {
    renderView(r.data);
    $('export').disabled = r.data.kind !== 'success';
  } else if (r.data.kind === 'cancelled') {
    show($('notice'), 'Run cancelled.');
  } else {
    show($('error'), r.data.error || `Request failed (HTTP ${r.status})`);
  }
}

async function cancelRun() {
  await api('POST', '/api/run/cancel');
}

async function exportResult() {
  const r = await api('POST', '/api/export', {});
  if (r.ok) show($('notice'), 'Exported to spreadsheet.');
  else show($('error'), r.data.error || 'Export failed');
}

async function init() {
  const health = await api('GET', '/api/health');
  if (health.ok) {
    $('backend').textContent = health.data.backend_url +
      (health.data.backend_reachable ? '' : ' (unreachable)');
  }
  const s = await api('GET', '/api/session');
  if (s.ok) applySession(s.data);
  if (!s.ok || s.data.flights.length === 0) await loadFlights();
}

$('run').addEventListener('click', run);
$('cancel').addEventListener('click', cancelRun);
$('reload').addEventListener('click', loadFlights);
$('export').addEventListener('click', exportResult);
init();
</script>
</body>
</html>
"##;
