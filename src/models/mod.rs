pub mod category;
pub mod comment;
pub mod event;
pub mod reaction;
pub mod rsvp;
pub mod tags;
pub mod user;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct MessageResponse {
  pub message: String,
}

impl MessageResponse {
  pub fn new(message: impl Into<String>) -> Self {
    MessageResponse {
      message: message.into(),
    }
  }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
  pub success: bool,
}

/// Offset/limit window for a paginated listing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageWindow {
  pub page: i64,
  pub limit: i64,
  pub offset: i64,
}

impl PageWindow {
  fn limit_or_default(limit: Option<i64>, default_limit: i64) -> i64 {
    match limit {
      Some(limit) if limit > 0 => limit,
      _ => default_limit,
    }
  }

  /// Pages numbered from 0; `page * limit` rows are skipped.
  pub fn zero_based(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
    let limit = Self::limit_or_default(limit, default_limit);
    let page = page.unwrap_or(0).max(0);
    PageWindow {
      page,
      limit,
      offset: page.saturating_mul(limit),
    }
  }

  /// Pages numbered from 1; `(page - 1) * limit` rows are skipped.
  pub fn one_based(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
    let limit = Self::limit_or_default(limit, default_limit);
    let page = page.unwrap_or(1).max(1);
    PageWindow {
      page,
      limit,
      offset: (page - 1).saturating_mul(limit),
    }
  }

  pub fn total_pages(&self, total: i64) -> i64 {
    total / self.limit + i64::from(total % self.limit != 0)
  }
}

#[test]
fn test_page_window_zero_based() {
  let window = PageWindow::zero_based(Some(2), Some(5), 10);
  assert_eq!(window.offset, 10);
  assert_eq!(window.total_pages(11), 3);

  let window = PageWindow::zero_based(None, Some(0), 15);
  assert_eq!(window, PageWindow {
    page: 0,
    limit: 15,
    offset: 0
  });
}

#[test]
fn test_page_window_one_based() {
  let window = PageWindow::one_based(Some(3), None, 10);
  assert_eq!(window.offset, 20);
  assert_eq!(window.total_pages(0), 0);
  assert_eq!(window.total_pages(20), 2);

  let window = PageWindow::one_based(Some(-4), Some(2), 10);
  assert_eq!(window.page, 1);
  assert_eq!(window.offset, 0);
}

#[test]
fn test_page_window_huge_values_saturate() {
  let window = PageWindow::zero_based(Some(i64::MAX), Some(i64::MAX), 10);
  assert_eq!(window.offset, i64::MAX);
  assert_eq!(window.total_pages(i64::MAX), 1);
  assert_eq!(window.total_pages(3), 1);

  let window = PageWindow::one_based(Some(i64::MAX), Some(10), 10);
  assert_eq!(window.offset, i64::MAX);
  assert_eq!(window.total_pages(i64::MAX), i64::MAX / 10 + 1);
}
