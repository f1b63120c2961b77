/// Served at `/dashboard` when the static dir has no `dashboard.html`.
/// Element ids match `display::slot`; the page polls the board and renders it.
pub const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>GenetAi Presale Dashboard</title>
<style>
*{box-sizing:border-box;margin:0;padding:0}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#0f1117;color:#e1e4e8;min-height:100vh;padding:16px}
h1{font-size:20px;margin-bottom:12px;color:#58a6ff}
h2{font-size:14px;font-weight:600;color:#8b949e;text-transform:uppercase;letter-spacing:1px;margin-bottom:8px}
.grid{display:grid;grid-template-columns:1fr 1fr;gap:12px;max-width:900px;margin:0 auto}
.full{grid-column:1/-1}
.card{background:#161b22;border:1px solid #30363d;border-radius:8px;padding:14px}
.status-bar{display:flex;gap:12px;flex-wrap:wrap;align-items:center;margin-bottom:8px}
.badge{padding:3px 10px;border-radius:12px;font-size:12px;font-weight:600;text-transform:uppercase;background:#30363d;color:#8b949e}
.badge.active,.badge.connected{background:#238636;color:#fff}
.badge.ended{background:#da3633;color:#fff}
.stat{margin:4px 0}
.stat span{color:#8b949e;font-size:12px}
.stat strong{color:#e1e4e8;font-size:14px;margin-left:4px}
.bar{height:10px;background:#30363d;border-radius:5px;overflow:hidden;margin:8px 0}
.bar>div{height:100%;background:#d29922;transition:width .3s}
.bar>div.halfway{background:#58a6ff}
.bar>div.complete{background:#3fb950}
input,select{background:#0d1117;border:1px solid #30363d;color:#e1e4e8;padding:6px 10px;border-radius:4px;font-size:13px;width:100%}
input:focus,select:focus{outline:none;border-color:#58a6ff}
label{font-size:12px;color:#8b949e;display:block;margin-bottom:3px;margin-top:8px}
.row{display:flex;gap:8px;margin-top:8px}
.row>*{flex:1}
button{padding:8px 14px;border:none;border-radius:6px;font-size:13px;font-weight:600;cursor:pointer;transition:opacity .15s}
button:hover{opacity:.85}
button:disabled{opacity:.4;cursor:not-allowed}
.btn-primary{background:#238636;color:#fff}
.btn-warn{background:#d29922;color:#000}
.btn-muted{background:#30363d;color:#e1e4e8}
.hidden{display:none}
.muted{font-size:11px;color:#484f58}
#toasts{position:fixed;top:16px;right:16px;display:flex;flex-direction:column;gap:6px;z-index:999;max-width:350px}
.toast{padding:10px 16px;border-radius:6px;font-size:13px;color:#fff;background:#30363d}
.toast.success{background:#238636}
.toast.error{background:#da3633}
.modal{position:fixed;inset:0;background:rgba(0,0,0,.6);display:flex;align-items:center;justify-content:center}
.modal .card{min-width:300px}
.modal button{width:100%;margin-top:8px}
</style>
</head>
<body>

<div id="toasts"></div>

<div class="grid">

<div class="card full">
  <div class="status-bar">
    <h1>GenetAi Presale</h1>
    <span class="badge" id="presaleStatus">-</span>
    <span class="badge" id="walletStatus">Not Connected</span>
    <span class="muted" id="lastUpdated"></span>
  </div>
  <div class="bar"><div id="progressBar" style="width:0%"></div></div>
  <div class="status-bar">
    <div class="stat"><span>Progress</span><strong id="presaleProgress">0.0%</strong></div>
    <div class="stat"><span>Raised</span><strong id="raisedAmount">-</strong></div>
    <div class="stat"><span>Target</span><strong id="targetAmount">-</strong></div>
    <div class="stat"><span>Remaining</span><strong id="remainingAmount">-</strong></div>
  </div>
</div>

<div class="card">
  <h2>Presale</h2>
  <div class="stat"><span>Total raised</span><strong id="totalRaised">-</strong></div>
  <div class="stat"><span>In USD</span><strong id="totalRaisedUSD">-</strong></div>
  <div class="stat"><span>Hard cap</span><strong id="hardCap">-</strong></div>
  <div class="stat"><span>Contributors</span><strong id="totalContributors">-</strong></div>
  <div class="stat"><span>Average</span><strong id="averageContribution">-</strong></div>
  <div class="stat"><span>Token price</span><strong id="tokenPriceDisplay">-</strong></div>
  <div class="stat"><span>Tokens sold</span><strong id="tokensSold">-</strong></div>
  <div class="stat"><span>Days left</span><strong id="daysLeft">-</strong></div>
  <div class="stat"><span>Min</span><strong id="minContribution">-</strong></div>
  <div class="stat"><span>Max</span><strong id="maxContribution">-</strong></div>
  <div class="stat"><span>Access</span><strong id="whitelistStatus">-</strong></div>
</div>

<div class="card">
  <h2>Wallet</h2>
  <div class="stat"><span>Address</span><strong id="walletAddress"></strong></div>
  <div class="stat"><span>Type</span><strong id="walletType"></strong></div>
  <div class="stat"><span>Balance</span><strong id="walletBalance"></strong></div>
  <div id="walletInfoCompact" class="muted hidden">
    <span id="walletAddressCompact"></span> · <span id="walletBalanceCompact"></span>
  </div>
  <button class="btn-primary" id="connectWallet" onclick="toggleWallet()">Connect Wallet</button>

  <div id="userStats" class="hidden">
    <div class="stat"><span>Your contribution</span><strong id="userContribution"></strong></div>
    <div class="stat"><span>Your tokens</span><strong id="userTokens"></strong></div>
  </div>
  <div id="claimSection" class="hidden">
    <button class="btn-warn" onclick="claim()">Claim Tokens</button>
  </div>
</div>

<div class="card full">
  <h2>Contribute</h2>
  <label for="contributionAmount">Amount</label>
  <input id="contributionAmount" type="number" min="0" step="0.01" placeholder="0.0" oninput="estimate()">
  <div class="stat"><span>You receive</span><strong id="tokenAmount">0</strong> <span>$GENE</span></div>
  <div class="row">
    <button class="btn-primary" id="contributeBtn" onclick="contribute()">Connect Wallet to Contribute</button>
  </div>
</div>

</div>

<div class="modal hidden" id="walletModal">
  <div class="card">
    <h2 id="walletModalTitle">Connect</h2>
    <div class="muted" id="walletModalInfo"></div>
    <div id="walletModalOptions"></div>
    <button class="btn-muted" onclick="closeModal()">Cancel</button>
  </div>
</div>

<script>
const API = '';
let connected = false;
const seen = new Set();

async function api(path, opts) {
  const r = await fetch(API + path, opts);
  const text = await r.text();
  let body;
  try { body = JSON.parse(text); } catch(e) { body = text; }
  if (!r.ok) throw new Error(typeof body === 'string' ? body : r.statusText);
  return body;
}

function post(path, body) {
  return api(path, {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify(body || {}),
  });
}

function render(slots) {
  for (const [id, slot] of Object.entries(slots)) {
    const el = document.getElementById(id);
    if (!el) continue;
    el.classList.toggle('hidden', !slot.visible);
    if (el.children.length === 0 && slot.text !== '') el.textContent = slot.text;
    if (slot.tone && el.classList.contains('badge')) el.className = 'badge ' + slot.tone;
  }
  const bar = document.getElementById('progressBar');
  if (slots.progressWidth) bar.style.width = slots.progressWidth.text;
  if (slots.progressTone) bar.className = slots.progressTone.tone || '';
}

async function pollLive() {
  try {
    const live = await api('/api/live');
    connected = live.connected;
    render(live.slots);
  } catch(e) {}
}

async function pollNotices() {
  try {
    const notices = await api('/api/notifications');
    const box = document.getElementById('toasts');
    for (const n of notices) {
      if (seen.has(n.id)) continue;
      seen.add(n.id);
      const d = document.createElement('div');
      d.className = 'toast ' + n.kind;
      d.textContent = n.message;
      box.appendChild(d);
      setTimeout(() => d.remove(), 5000);
    }
  } catch(e) {}
}

async function openModal() {
  const opts = await api('/api/wallet/options');
  document.getElementById('walletModalTitle').textContent = opts.title;
  document.getElementById('walletModalInfo').textContent = opts.network_info;
  const list = document.getElementById('walletModalOptions');
  list.innerHTML = '';
  for (const o of opts.options) {
    const b = document.createElement('button');
    b.className = 'btn-primary';
    b.textContent = o.label + (o.available ? '' : ' (not configured)');
    b.onclick = () => connect(o.kind);
    list.appendChild(b);
  }
  document.getElementById('walletModal').classList.remove('hidden');
}

function closeModal() {
  document.getElementById('walletModal').classList.add('hidden');
}

async function connect(kind) {
  closeModal();
  try { await post('/api/wallet/connect', {kind}); } catch(e) {}
  refresh();
}

async function toggleWallet() {
  if (connected) {
    await post('/api/wallet/disconnect');
    refresh();
  } else {
    openModal();
  }
}

async function contribute() {
  if (!connected) return openModal();
  const amount = document.getElementById('contributionAmount').value;
  const btn = document.getElementById('contributeBtn');
  btn.disabled = true;
  try { await post('/api/contribute', {amount}); } catch(e) {}
  btn.disabled = false;
  refresh();
}

async function claim() {
  try { await post('/api/claim'); } catch(e) {}
  refresh();
}

async function estimate() {
  const amount = document.getElementById('contributionAmount').value;
  try {
    const r = await post('/api/estimate', {amount});
    document.getElementById('tokenAmount').textContent = r.display;
  } catch(e) {}
}

function refresh() { pollLive(); pollNotices(); }

refresh();
setInterval(refresh, 1500);
</script>
</body>
</html>
"##;
