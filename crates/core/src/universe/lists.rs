//! Curated symbol lists used to build the default tiers.

pub const SP500_TECH: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "GOOG", "AMZN", "NVDA", "META", "TSLA", "AVGO", "ORCL", "ADBE", "CRM",
    "CSCO", "ACN", "AMD", "INTC", "QCOM", "TXN", "INTU", "NOW", "AMAT", "MU", "PANW", "SNPS",
    "CDNS", "LRCX", "KLAC", "MRVL", "NXPI", "ADSK", "FTNT", "MCHP", "ADI", "ABNB", "SNOW", "PLTR",
    "CRWD", "ZS", "DDOG", "NET", "OKTA", "MDB", "TEAM", "WDAY", "VEEV", "DOCU", "ZM", "TWLO",
    "SHOP", "SQ", "UBER", "LYFT", "DASH", "RBLX", "U", "PINS", "SNAP", "SPOT", "ROKU", "TTD",
    "MTCH", "BMBL", "YELP", "CVNA",
];

pub const MAJOR_ETFS: &[&str] = &[
    "SPY", "QQQ", "IWM", "DIA", "VTI", "VOO", "VEA", "VWO", "EEM", "EFA", "AGG", "BND", "LQD",
    "HYG", "TLT", "GLD", "SLV", "USO", "XLE", "XLF", "XLK", "XLV", "XLI", "XLP", "XLY", "XLU",
    "XLB", "XLRE", "XLC", "VNQ", "SMH", "SOXX", "ARKK", "ARKG", "ARKW", "ARKF", "ARKQ", "ARKX",
    "SQQQ", "TQQQ", "SPXL", "SPXS", "UPRO", "UDOW", "TNA", "TZA", "FAS", "FAZ",
];

pub const SP500_LARGE_CAP: &[&str] = &[
    // Consumer discretionary
    "AMZN", "TSLA", "HD", "MCD", "NKE", "SBUX", "LOW", "TJX", "BKNG", "CMG", "MAR", "ABNB", "GM",
    "F", "DHI", "LEN", "YUM", "ORLY", "AZO", "ROST", "DG", "DLTR", "ULTA", "DPZ",
    // Consumer staples
    "WMT", "PG", "COST", "KO", "PEP", "PM", "MO", "MDLZ", "CL", "KMB", "GIS", "K", "HSY", "MNST",
    "KDP", "TSN", "HRL", "SJM", "CPB", "CAG", "LW", "TAP", "BF.B", "STZ",
    // Energy
    "XOM", "CVX", "COP", "SLB", "EOG", "MPC", "PSX", "VLO", "OXY", "HAL", "BKR", "DVN", "FANG",
    "MRO", "APA", "HES", "KMI", "WMB", "OKE", "LNG", "TRGP", "EPD", "ET", "MPLX",
    // Financials
    "BRK.B", "JPM", "BAC", "WFC", "C", "GS", "MS", "SCHW", "BLK", "SPGI", "CME", "ICE", "MCO",
    "AXP", "V", "MA", "PYPL", "USB", "PNC", "TFC", "COF", "BK", "STT", "NTRS", "AIG", "PRU",
    "MET", "AFL", "ALL", "TRV", "PGR", "CB", "AJG", "MMC", "AON", "WTW", "BRO", "HIG", "CNA",
    "RLI",
    // Healthcare
    "UNH", "JNJ", "LLY", "ABBV", "MRK", "TMO", "ABT", "DHR", "PFE", "BMY", "AMGN", "GILD",
    "REGN", "VRTX", "CI", "CVS", "HUM", "ELV", "CNC", "MOH", "BIIB", "ISRG", "SYK", "BSX", "MDT",
    "ZTS", "EW", "IDXX", "DXCM", "ALGN", "RMD", "HOLX", "BAX", "BDX", "A", "TECH", "PODD",
    "XRAY", "ZBH", "RVTY",
    // Industrials
    "UPS", "CAT", "HON", "RTX", "BA", "GE", "LMT", "DE", "MMM", "ETN", "ITW", "EMR", "PH", "FDX",
    "NOC", "GD", "TDG", "LHX", "CARR", "OTIS", "PCAR", "CMI", "ROK", "DOV", "AME", "FTV", "XYL",
    "IEX", "GNRC", "PWR", "AOS",
    // Materials
    "LIN", "APD", "SHW", "ECL", "DD", "DOW", "NEM", "FCX", "NUE", "VMC", "MLM", "ALB", "CE",
    "EMN", "LYB", "CF", "MOS", "FMC", "IFF", "PPG", "RPM", "SEE", "BALL", "AVY",
    // Real estate
    "AMT", "PLD", "CCI", "EQIX", "PSA", "WELL", "DLR", "O", "SPG", "VICI", "AVB", "EQR", "VTR",
    "ARE", "INVH", "MAA", "ESS", "UDR", "CPT", "EXR", "CUBE", "LSI", "REXR", "FR",
    // Utilities
    "NEE", "DUK", "SO", "D", "AEP", "EXC", "SRE", "PEG", "XEL", "ED", "WEC", "ES", "AWK", "DTE",
    "PPL", "CMS", "AEE", "LNT", "EVRG", "NI", "ATO", "CNP", "NWE", "PNW",
    // Communication services
    "GOOGL", "META", "DIS", "NFLX", "CMCSA", "T", "VZ", "TMUS", "CHTR", "EA", "TTWO", "OMC",
    "IPG", "FOXA", "PARA",
];

pub const MID_CAP_GROWTH: &[&str] = &[
    "COIN", "HOOD", "SOFI", "AFRM", "UPST", "LC", "SQ", "PYPL", "RIVN", "LCID", "FSR", "GOEV",
    "PLUG", "FCEL", "BE", "BLNK", "CHPT", "EVGO", "ENPH", "SEDG", "RUN", "NOVA", "ARRY", "MAXN",
    "MARA", "RIOT", "CLSK", "HUT", "BITF", "ARBK", "WULF", "CIFR", "DKNG", "PENN", "GENI", "FUBO",
    "MSGS", "BETZ", "RSI", "CZR", "MGM", "WYNN", "LVS", "MLCO", "BYD", "RCL", "CCL", "NCLH",
    "ALK", "UAL", "DAL", "AAL", "LUV", "JBLU", "SAVE", "HA",
];

pub const SEMICONDUCTORS: &[&str] = &[
    "NVDA", "AMD", "INTC", "QCOM", "AVGO", "TXN", "MU", "AMAT", "LRCX", "KLAC", "SNPS", "CDNS",
    "MRVL", "NXPI", "MCHP", "ADI", "ON", "MPWR", "SWKS", "QRVO", "WOLF", "CRUS", "SLAB", "ALGM",
    "NVMI", "COHU", "FORM", "UCTT", "MKSI", "ENTG", "ICHR", "ACLS", "ASML", "TSM", "UMC", "ASX",
    "HIMX", "SIMO", "DIOD", "POWI",
];

pub const BIOTECH_PHARMA: &[&str] = &[
    "MRNA", "BNTX", "NVAX", "VRTX", "REGN", "GILD", "BIIB", "AMGN", "SGEN", "EXAS", "ILMN", "INCY",
    "ALNY", "BMRN", "RARE", "FOLD", "ARWR", "IONS", "RGEN", "TECH", "VCEL", "BLUE", "CRSP", "EDIT",
    "NTLA", "BEAM", "VERV", "FATE", "SGMO", "PACB", "CDNA", "TWST", "SRPT", "UTHR", "JAZZ", "HALO",
    "NBIX", "ACAD", "SAGE", "ALKS", "PTCT", "ITCI", "ARVN", "KRTX", "SAVA", "AXSM", "CORT", "LBPH",
    "KRYS", "PRTA", "TGTX", "AGIO", "APLS", "YMAB", "IMVT", "KYMR",
];

pub const SOFTWARE_CLOUD: &[&str] = &[
    "MSFT", "ORCL", "ADBE", "CRM", "NOW", "INTU", "WDAY", "SNOW", "PLTR", "CRWD", "ZS", "DDOG",
    "NET", "OKTA", "MDB", "TEAM", "VEEV", "DOCU", "ZM", "TWLO", "SHOP", "SQ", "UBER", "LYFT",
    "DASH", "ABNB", "RBLX", "U", "PINS", "SNAP", "SPOT", "ROKU", "TTD", "MTCH", "BMBL", "YELP",
    "CVNA", "CARG", "CPNG", "SE", "MELI", "BABA", "JD", "PDD", "BIDU", "NIO", "XPEV", "LI",
];

pub const FINTECH: &[&str] = &[
    "V", "MA", "PYPL", "SQ", "COIN", "HOOD", "SOFI", "AFRM", "UPST", "LC", "NU", "PAGS", "STNE",
    "MELI", "MARA", "RIOT", "CLSK", "HUT", "BITF", "ARBK", "WULF", "CIFR", "SI", "FOUR",
];

pub const ECOMMERCE_DIGITAL: &[&str] = &[
    "AMZN", "SHOP", "MELI", "SE", "CPNG", "BABA", "JD", "PDD", "EBAY", "ETSY", "W", "CHWY",
    "FTCH", "REAL", "RVLV", "VSCO",
];

pub const CYBERSECURITY: &[&str] = &[
    "CRWD", "ZS", "PANW", "FTNT", "NET", "OKTA", "S", "TENB", "CYBR", "QLYS", "VRNS", "RPD",
    "SAIL", "RBRK", "FSLY", "AKAM",
];

pub const CLOUD_INFRA: &[&str] = &[
    "AMZN", "MSFT", "GOOGL", "ORCL", "IBM", "CSCO", "ANET", "DELL", "HPE", "NTAP", "PSTG", "WDC",
    "STX", "MU", "SMCI", "NVDA",
];

pub const AD_MEDIA: &[&str] = &[
    "GOOGL", "META", "TTD", "MGNI", "PUBM", "APPS", "DIS", "NFLX", "PARA", "WBD", "FOXA", "CMCSA",
    "OMC", "IPG", "ROKU", "SPOT",
];

pub const CONSUMER_INTERNET: &[&str] = &[
    "GOOGL", "META", "NFLX", "UBER", "LYFT", "DASH", "ABNB", "BKNG", "EXPE", "TRIP", "YELP",
    "GRUB", "CVNA", "CARG", "VROOM", "KMX",
];

pub const HEALTH_TECH: &[&str] = &[
    "TDOC", "DOCS", "ONEM", "HIMS", "ACCD", "LFST", "SDGR", "GDRX", "OSCR", "PHR", "TNDM", "DXCM",
    "PODD", "ISRG", "VEEV", "CERN",
];
