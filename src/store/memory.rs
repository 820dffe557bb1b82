//! In-memory store mirroring the SQL schema's uniqueness rules.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use super::{
    CatalogStore, EnrollmentStore, InstructorStore, ReviewStore, StoreError, UserStore,
};
use crate::models::{
    course::{
        Course, CourseFilter, CourseUpdate, Lesson, Module, NewCourse, NewLesson, NewModule,
        PageWindow, RatingStats,
    },
    enrollment::{
        Enrollment, LessonCounts, NewEnrollment, PaidEnrollment, PaymentStatus, ProgressUpdate,
    },
    instructor::{RecentEnrollment, RecentReview},
    money::Money,
    progress::{LessonProgress, ProgressPatch},
    review::{NewReview, Review},
    subject::Subject,
    user::{NewUser, User},
};

fn course_matches(filter: &CourseFilter, course: &Course) -> bool {
    if filter.subject_id.is_some_and(|id| id != course.subject_id) {
        return false;
    }
    if filter.level.as_deref().is_some_and(|level| level != course.level) {
        return false;
    }
    if filter.featured && !course.featured {
        return false;
    }
    match &filter.search {
        Some(needle) => {
            let needle = needle.to_lowercase();
            course.title.to_lowercase().contains(&needle)
                || course.description.to_lowercase().contains(&needle)
        }
        None => true,
    }
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    ticks: i64,
    users: Vec<User>,
    subjects: Vec<Subject>,
    courses: Vec<Course>,
    modules: Vec<Module>,
    lessons: Vec<Lesson>,
    enrollments: Vec<Enrollment>,
    progress: Vec<LessonProgress>,
    reviews: Vec<Review>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps so "newest first" orderings are stable.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc::now() + Duration::milliseconds(self.ticks)
    }

    fn course_lesson_ids(&self, course_id: i64) -> HashSet<i64> {
        let module_ids: HashSet<i64> = self
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .map(|m| m.id)
            .collect();

        self.lessons
            .iter()
            .filter(|l| module_ids.contains(&l.module_id))
            .map(|l| l.id)
            .collect()
    }

    fn instructor_course_ids(&self, instructor_id: i64) -> HashSet<i64> {
        self.courses
            .iter()
            .filter(|c| c.instructor_id == instructor_id)
            .map(|c| c.id)
            .collect()
    }

    fn course_title(&self, course_id: i64) -> String {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .map(|c| c.title.clone())
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subject(&self, name: &str, code: &str) -> Subject {
        let mut tables = self.tables.lock();
        let subject = Subject {
            id: tables.id(),
            name: name.to_string(),
            code: code.to_string(),
            image_url: None,
            grade_level: None,
            created_at: tables.now(),
        };
        tables.subjects.push(subject.clone());
        subject
    }

    pub fn enrollment_rows(&self, user_id: i64, course_id: i64) -> usize {
        self.tables
            .lock()
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id && e.course_id == course_id)
            .count()
    }

    pub fn review_rows(&self, user_id: i64, course_id: i64) -> usize {
        self.tables
            .lock()
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && r.course_id == course_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock();
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Conflict("user"));
        }

        let created = User {
            id: tables.id(),
            username: user.username,
            password: user.password,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            bio: user.bio,
            role: user.role,
            created_at: tables.now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn user_exists(&self, email: &str, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .any(|u| u.email == email || u.username == username))
    }

    async fn users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, StoreError> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>, StoreError> {
        let mut subjects = self.tables.lock().subjects.clone();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError> {
        Ok(self
            .tables
            .lock()
            .subjects
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn find_subject(&self, id: i64) -> Result<Option<Subject>, StoreError> {
        Ok(self.tables.lock().subjects.iter().find(|s| s.id == id).cloned())
    }

    async fn list_courses(
        &self,
        filter: &CourseFilter,
        window: PageWindow,
    ) -> Result<Vec<Course>, StoreError> {
        let mut matching: Vec<Course> = self
            .tables
            .lock()
            .courses
            .iter()
            .filter(|c| course_matches(filter, c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(0);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError> {
        let count = self
            .tables
            .lock()
            .courses
            .iter()
            .filter(|c| course_matches(filter, c))
            .count();
        Ok(count as i64)
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, StoreError> {
        Ok(self.tables.lock().courses.iter().find(|c| c.id == id).cloned())
    }

    async fn create_course(&self, course: NewCourse) -> Result<Course, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.subjects.iter().any(|s| s.id == course.subject_id) {
            return Err(StoreError::MissingReference("subject"));
        }

        let created = Course {
            id: tables.id(),
            title: course.title,
            description: course.description,
            price: course.price,
            image_url: course.image_url,
            level: course.level,
            duration: course.duration,
            subject_id: course.subject_id,
            instructor_id: course.instructor_id,
            featured: course.featured,
            best_seller: course.best_seller,
            is_new: course.is_new,
            grade_level: course.grade_level,
            published_at: course.published_at,
            created_at: tables.now(),
            updated_at: None,
        };
        tables.courses.push(created.clone());
        Ok(created)
    }

    async fn update_course(
        &self,
        id: i64,
        update: CourseUpdate,
    ) -> Result<Option<Course>, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();
        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        course.title = update.title;
        course.description = update.description;
        course.price = update.price;
        course.image_url = update.image_url;
        course.level = update.level;
        course.duration = update.duration;
        course.featured = update.featured;
        course.best_seller = update.best_seller;
        course.is_new = update.is_new;
        course.grade_level = update.grade_level;
        course.published_at = update.published_at;
        course.updated_at = Some(now);
        Ok(Some(course.clone()))
    }

    async fn course_modules(&self, course_id: i64) -> Result<Vec<Module>, StoreError> {
        let mut modules: Vec<Module> = self
            .tables
            .lock()
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.order_index);
        Ok(modules)
    }

    async fn find_module(&self, id: i64) -> Result<Option<Module>, StoreError> {
        Ok(self.tables.lock().modules.iter().find(|m| m.id == id).cloned())
    }

    async fn create_module(&self, module: NewModule) -> Result<Module, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.courses.iter().any(|c| c.id == module.course_id) {
            return Err(StoreError::MissingReference("course"));
        }
        if tables
            .modules
            .iter()
            .any(|m| m.course_id == module.course_id && m.order_index == module.order_index)
        {
            return Err(StoreError::Conflict("module"));
        }

        let created = Module {
            id: tables.id(),
            title: module.title,
            description: module.description,
            order_index: module.order_index,
            course_id: module.course_id,
            created_at: tables.now(),
            updated_at: None,
        };
        tables.modules.push(created.clone());
        Ok(created)
    }

    async fn module_lessons(&self, module_ids: &[i64]) -> Result<Vec<Lesson>, StoreError> {
        let mut lessons: Vec<Lesson> = self
            .tables
            .lock()
            .lessons
            .iter()
            .filter(|l| module_ids.contains(&l.module_id))
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.module_id, l.order_index));
        Ok(lessons)
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, StoreError> {
        Ok(self.tables.lock().lessons.iter().find(|l| l.id == id).cloned())
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.modules.iter().any(|m| m.id == lesson.module_id) {
            return Err(StoreError::MissingReference("module"));
        }
        if tables
            .lessons
            .iter()
            .any(|l| l.module_id == lesson.module_id && l.order_index == lesson.order_index)
        {
            return Err(StoreError::Conflict("lesson"));
        }

        let created = Lesson {
            id: tables.id(),
            title: lesson.title,
            description: lesson.description,
            content: lesson.content,
            video_url: lesson.video_url,
            duration: lesson.duration,
            order_index: lesson.order_index,
            module_id: lesson.module_id,
            created_at: tables.now(),
            updated_at: None,
        };
        tables.lessons.push(created.clone());
        Ok(created)
    }

    async fn rating_stats(&self, course_ids: &[i64]) -> Result<Vec<RatingStats>, StoreError> {
        let tables = self.tables.lock();
        let stats = course_ids
            .iter()
            .filter_map(|&course_id| {
                let ratings: Vec<i32> = tables
                    .reviews
                    .iter()
                    .filter(|r| r.course_id == course_id)
                    .map(|r| r.rating)
                    .collect();
                if ratings.is_empty() {
                    return None;
                }
                let sum: i32 = ratings.iter().sum();
                Some(RatingStats {
                    course_id,
                    average: f64::from(sum) / ratings.len() as f64,
                    count: ratings.len() as i64,
                })
            })
            .collect();
        Ok(stats)
    }

    async fn course_reviews(&self, course_id: i64) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .tables
            .lock()
            .reviews
            .iter()
            .filter(|r| r.course_id == course_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn find_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<Option<Enrollment>, StoreError> {
        Ok(self
            .tables
            .lock()
            .enrollments
            .iter()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollment,
    ) -> Result<Enrollment, StoreError> {
        let mut tables = self.tables.lock();
        if tables
            .enrollments
            .iter()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id)
        {
            return Err(StoreError::Conflict("enrollment"));
        }

        let created = Enrollment {
            id: tables.id(),
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            enrolled_at: tables.now(),
            completed: false,
            completed_at: None,
            progress: 0,
            payment_status: enrollment.payment_status,
            payment_amount: Some(enrollment.payment_amount),
            payment_id: enrollment.payment_id,
            updated_at: None,
        };
        tables.enrollments.push(created.clone());
        Ok(created)
    }

    async fn upsert_paid_enrollment(
        &self,
        payment: PaidEnrollment,
    ) -> Result<Enrollment, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();

        if let Some(existing) = tables
            .enrollments
            .iter_mut()
            .find(|e| e.user_id == payment.user_id && e.course_id == payment.course_id)
        {
            existing.payment_status = PaymentStatus::Completed;
            existing.payment_id = Some(payment.payment_id);
            existing.payment_amount = Some(payment.payment_amount);
            existing.updated_at = Some(now);
            return Ok(existing.clone());
        }

        let created = Enrollment {
            id: tables.id(),
            user_id: payment.user_id,
            course_id: payment.course_id,
            enrolled_at: now,
            completed: false,
            completed_at: None,
            progress: 0,
            payment_status: PaymentStatus::Completed,
            payment_amount: Some(payment.payment_amount),
            payment_id: Some(payment.payment_id),
            updated_at: None,
        };
        tables.enrollments.push(created.clone());
        Ok(created)
    }

    async fn mark_payment_failed(
        &self,
        user_id: i64,
        course_id: i64,
        payment_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();
        let updated = tables
            .enrollments
            .iter_mut()
            .find(|e| {
                e.user_id == user_id
                    && e.course_id == course_id
                    && e.payment_status != PaymentStatus::Completed
            })
            .map(|e| {
                e.payment_status = PaymentStatus::Failed;
                e.payment_id = Some(payment_id.to_string());
                e.updated_at = Some(now);
                e.clone()
            });
        Ok(updated)
    }

    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: ProgressUpdate,
    ) -> Result<Option<Enrollment>, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();
        let updated = tables
            .enrollments
            .iter_mut()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .map(|e| {
                e.progress = update.progress;
                e.completed = update.completed;
                e.completed_at = update.completed_at;
                e.updated_at = Some(now);
                e.clone()
            });
        Ok(updated)
    }

    async fn user_enrollments(&self, user_id: i64) -> Result<Vec<Enrollment>, StoreError> {
        let mut enrollments: Vec<Enrollment> = self
            .tables
            .lock()
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at).then(b.id.cmp(&a.id)));
        Ok(enrollments)
    }

    async fn find_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
    ) -> Result<Option<LessonProgress>, StoreError> {
        Ok(self
            .tables
            .lock()
            .progress
            .iter()
            .find(|p| p.user_id == user_id && p.lesson_id == lesson_id)
            .cloned())
    }

    async fn upsert_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        patch: ProgressPatch,
    ) -> Result<LessonProgress, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();

        if let Some(existing) = tables
            .progress
            .iter_mut()
            .find(|p| p.user_id == user_id && p.lesson_id == lesson_id)
        {
            if let Some(completed) = patch.completed {
                existing.completed = completed;
            }
            if let Some(position) = patch.last_position {
                existing.last_position = position;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = LessonProgress {
            id: tables.id(),
            user_id,
            lesson_id,
            completed: patch.completed.unwrap_or(false),
            last_position: patch.last_position.unwrap_or(0),
            updated_at: now,
        };
        tables.progress.push(created.clone());
        Ok(created)
    }

    async fn lesson_counts(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<LessonCounts, StoreError> {
        let tables = self.tables.lock();
        let lesson_ids = tables.course_lesson_ids(course_id);
        let completed = tables
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.completed && lesson_ids.contains(&p.lesson_id))
            .count();

        Ok(LessonCounts {
            total: lesson_ids.len() as i64,
            completed: completed as i64,
        })
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn upsert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut tables = self.tables.lock();
        let now = tables.now();

        if let Some(existing) = tables
            .reviews
            .iter_mut()
            .find(|r| r.user_id == review.user_id && r.course_id == review.course_id)
        {
            existing.rating = review.rating;
            existing.comment = review.comment;
            existing.updated_at = Some(now);
            return Ok(existing.clone());
        }

        let created = Review {
            id: tables.id(),
            user_id: review.user_id,
            course_id: review.course_id,
            rating: review.rating,
            comment: review.comment,
            created_at: now,
            updated_at: None,
        };
        tables.reviews.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl InstructorStore for MemoryStore {
    async fn instructor_courses(&self, instructor_id: i64) -> Result<Vec<Course>, StoreError> {
        let mut courses: Vec<Course> = self
            .tables
            .lock()
            .courses
            .iter()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(courses)
    }

    async fn enrollment_count(&self, course_id: i64) -> Result<i64, StoreError> {
        let count = self
            .tables
            .lock()
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .count();
        Ok(count as i64)
    }

    async fn student_count(&self, instructor_id: i64) -> Result<i64, StoreError> {
        let tables = self.tables.lock();
        let course_ids = tables.instructor_course_ids(instructor_id);
        let students: HashSet<i64> = tables
            .enrollments
            .iter()
            .filter(|e| course_ids.contains(&e.course_id))
            .map(|e| e.user_id)
            .collect();
        Ok(students.len() as i64)
    }

    async fn revenue(&self, instructor_id: i64) -> Result<Money, StoreError> {
        let tables = self.tables.lock();
        let course_ids = tables.instructor_course_ids(instructor_id);
        let cents = tables
            .enrollments
            .iter()
            .filter(|e| {
                course_ids.contains(&e.course_id) && e.payment_status == PaymentStatus::Completed
            })
            .filter_map(|e| e.payment_amount)
            .map(Money::cents)
            .sum();
        Ok(Money::from_cents(cents))
    }

    async fn average_rating(&self, instructor_id: i64) -> Result<Option<f64>, StoreError> {
        let tables = self.tables.lock();
        let course_ids = tables.instructor_course_ids(instructor_id);
        let ratings: Vec<i32> = tables
            .reviews
            .iter()
            .filter(|r| course_ids.contains(&r.course_id))
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        let sum: i32 = ratings.iter().sum();
        Ok(Some(f64::from(sum) / ratings.len() as f64))
    }

    async fn recent_enrollments(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentEnrollment>, StoreError> {
        let tables = self.tables.lock();
        let course_ids = tables.instructor_course_ids(instructor_id);
        let mut recent: Vec<RecentEnrollment> = tables
            .enrollments
            .iter()
            .filter(|e| course_ids.contains(&e.course_id))
            .map(|e| RecentEnrollment {
                enrollment_id: e.id,
                enrolled_at: e.enrolled_at,
                course_id: e.course_id,
                course_title: tables.course_title(e.course_id),
                user_id: e.user_id,
            })
            .collect();
        recent.sort_by(|a, b| {
            b.enrolled_at
                .cmp(&a.enrolled_at)
                .then(b.enrollment_id.cmp(&a.enrollment_id))
        });
        recent.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(recent)
    }

    async fn recent_reviews(
        &self,
        instructor_id: i64,
        limit: i64,
    ) -> Result<Vec<RecentReview>, StoreError> {
        let tables = self.tables.lock();
        let course_ids = tables.instructor_course_ids(instructor_id);
        let mut recent: Vec<RecentReview> = tables
            .reviews
            .iter()
            .filter(|r| course_ids.contains(&r.course_id))
            .map(|r| RecentReview {
                review_id: r.id,
                rating: r.rating,
                comment: r.comment.clone(),
                created_at: r.created_at,
                course_id: r.course_id,
                course_title: tables.course_title(r.course_id),
                user_id: r.user_id,
                user_name: tables
                    .users
                    .iter()
                    .find(|u| u.id == r.user_id)
                    .map(|u| u.full_name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.review_id.cmp(&a.review_id)));
        recent.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(recent)
    }
}
