//! Telegram-flavoured Markdown rendering of signals.

use rust_decimal::Decimal;

use crate::signals::Signal;

fn breakout_type(signal: &Signal) -> &'static str {
    let (range, volume) = (signal.range_pct, signal.volume_multiple);
    if range <= Decimal::new(15, 1) && volume >= Decimal::from(3) {
        "EXPLOSIVE BREAKOUT FROM TIGHT BASE"
    } else if range <= Decimal::TWO && volume >= Decimal::new(25, 1) {
        "STRONG BREAKOUT WITH VOLUME"
    } else if range <= Decimal::from(3) && volume >= Decimal::TWO {
        "CLEAN BREAKOUT SETUP"
    } else {
        "BREAKOUT PATTERN"
    }
}

fn rating(strength: u8) -> &'static str {
    match strength {
        85..=u8::MAX => "EXCEPTIONAL",
        75..=84 => "STRONG",
        65..=74 => "GOOD",
        _ => "MARGINAL",
    }
}

/// Render a signal as a Markdown alert.
pub fn format_alert(signal: &Signal) -> String {
    let risk = &signal.risk;
    let tier = signal.tier.as_deref().unwrap_or("-");
    format!(
        "🚨 *BREAKOUT ALERT* 🚨\n\
         Score: *{strength}/100* | {rating}\n\n\
         📊 *{symbol}* @ ${price:.2}\n\
         ⏰ {time}\n\
         📍 Timeframe: {interval} | Tier: {tier}\n\n\
         *{kind}*\n\
         • Base: {range:.1}% range over 20 bars\n\
         • Volume: *{volume:.1}x average* ({volume_kind})\n\
         • Trend: 20 EMA > 50 EMA > 200 EMA, price above 20 EMA\n\
         • Bullish close above the range high\n\n\
         ⚠️ *RISK*\n\
         • Entry: ${entry:.2}\n\
         • Stop: ${stop:.2} ({stop_pct:.1}%, ATR {atr:.2})\n\
         • Targets: ${t1:.2} / ${t2:.2} / ${t3:.2}\n\
         • R:R {rr:.1}:1",
        strength = signal.strength,
        rating = rating(signal.strength),
        symbol = signal.symbol,
        price = signal.price,
        time = signal.time.format("%Y-%m-%d %H:%M UTC"),
        interval = signal.interval,
        tier = tier,
        kind = breakout_type(signal),
        range = signal.range_pct,
        volume = signal.volume_multiple,
        volume_kind = signal.volume_kind.as_str(),
        entry = risk.entry,
        stop = risk.stop,
        stop_pct = risk.stop_distance_pct,
        atr = risk.atr,
        t1 = risk.targets[0],
        t2 = risk.targets[1],
        t3 = risk.targets[2],
        rr = risk.risk_reward,
    )
}
